use tracing::debug;
use wire_data::Thresholds;
use wire_detect::PixelBox;
use wire_vision::liken;

use crate::element::Element;

/// Snap text elements onto shared rows and columns.
///
/// Elements must already be in render order. Every pair of same-kind text
/// elements is compared with the earlier one as reference. A candidate that
/// continues the reference's row takes its vertical extent, font size and
/// (when close) colors. A candidate that starts in the reference's column takes
/// its left edge and, when nearly equal, its font size. Passes repeat until
/// nothing moves, so running this twice is a no-op.
pub fn align_elements(elements: &mut [Element], thresholds: &Thresholds) {
    let max_passes = elements.len() + 1;
    for pass in 1..=max_passes {
        let mut changed = false;
        for j in 1..elements.len() {
            let (head, tail) = elements.split_at_mut(j);
            let candidate = &mut tail[0];
            for reference in head.iter() {
                changed |= align_pair(reference, candidate, thresholds);
            }
        }
        if !changed {
            debug!("Alignment settled after {} pass(es)", pass);
            return;
        }
    }
    debug!("Alignment stopped after {} passes", max_passes);
}

/// Returns whether `candidate` moved.
fn align_pair(reference: &Element, candidate: &mut Element, thresholds: &Thresholds) -> bool {
    let (Some(ref_text), Some(cand_text)) = (reference.text(), candidate.text()) else {
        return false;
    };
    if ref_text.kind != cand_text.kind {
        return false;
    }
    let ref_box = reference.bbox;
    let before = (candidate.bbox, candidate.text().cloned());

    // Row continuation
    let gap = candidate.bbox.xmin.abs_diff(ref_box.xmax);
    let drift = candidate.bbox.ymin.abs_diff(ref_box.ymin) as f64;
    let same_row = drift <= thresholds.row_tolerance * ref_box.height() as f64;
    if gap <= thresholds.align_max_gap && same_row {
        let bbox = candidate.bbox;
        if let Some(text) = candidate.text_mut() {
            let ratio = text.font_size as f64 / ref_text.font_size.max(1) as f64;
            if (thresholds.font_ratio_min..=thresholds.font_ratio_max).contains(&ratio) {
                text.font_size = ref_text.font_size;
                let (_, ink) = liken(
                    ref_text.colors.text(),
                    text.colors.text(),
                    thresholds.liken_threshold,
                );
                text.colors = text.colors.with_text(ink);
                if let (Some(ref_fill), Some(fill)) = (ref_text.colors.fill(), text.colors.fill()) {
                    let (_, fill) = liken(ref_fill, fill, thresholds.liken_threshold);
                    text.colors = text.colors.with_fill(fill);
                }
                // the label travels with its control
                let dy = ref_box.ymin as i64 - bbox.ymin as i64;
                let snapped = PixelBox::new(ref_box.ymin, bbox.xmin, ref_box.ymax, bbox.xmax);
                text.text_area = text
                    .text_area
                    .map(|area| area.offset(dy, 0).clamp_within(snapped));
                candidate.bbox = snapped;
            }
        }
    }

    // Column alignment
    let column = candidate.bbox.xmin.abs_diff(ref_box.xmin) <= thresholds.column_tolerance;
    if column && ref_box.xmin < candidate.bbox.xmax {
        candidate.bbox.xmin = ref_box.xmin;
        let bbox = candidate.bbox;
        if let Some(text) = candidate.text_mut() {
            if text.font_size.abs_diff(ref_text.font_size) <= thresholds.font_harmonize_px {
                text.font_size = ref_text.font_size;
            }
            text.text_area = text.text_area.map(|area| area.clamp_within(bbox));
        }
    }

    let moved = before != (candidate.bbox, candidate.text().cloned());
    if moved {
        debug!("Aligned {} on {}", candidate.id, reference.id);
    }
    moved
}
