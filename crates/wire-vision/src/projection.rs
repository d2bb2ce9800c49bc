use image::{imageops, GrayImage, Luma, RgbaImage};
use imageproc::contrast::otsu_level;
use tracing::debug;
use wire_data::Thresholds;
use wire_detect::PixelBox;

/// Otsu-binarize a region with ink set to 255 and paper to 0.
///
/// Whichever side of the threshold holds fewer pixels is treated as ink, so
/// light-on-dark and dark-on-light text both come out the same way. On an
/// even split the dark side is ink.
pub fn ink_mask(region: &RgbaImage) -> GrayImage {
    let gray = imageops::grayscale(region);
    let level = otsu_level(&gray);

    let total = gray.len();
    let dark = gray.pixels().filter(|p| p[0] <= level).count();
    let ink_is_dark = dark * 2 <= total;

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let is_dark = gray.get_pixel(x, y)[0] <= level;
        if is_dark == ink_is_dark {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Dark-on-white binary image as OCR engines like it.
pub(crate) fn binarize_for_ocr(region: &RgbaImage) -> GrayImage {
    let mut mask = ink_mask(region);
    imageops::invert(&mut mask);
    mask
}

/// Mean mask value of each row (0-255).
fn row_profile(mask: &GrayImage) -> Vec<f64> {
    let (w, h) = mask.dimensions();
    (0..h)
        .map(|y| {
            let sum: u64 = (0..w).map(|x| mask.get_pixel(x, y)[0] as u64).sum();
            sum as f64 / w.max(1) as f64
        })
        .collect()
}

/// Mean mask value of each column (0-255).
fn column_profile(mask: &GrayImage) -> Vec<f64> {
    let (w, h) = mask.dimensions();
    (0..w)
        .map(|x| {
            let sum: u64 = (0..h).map(|y| mask.get_pixel(x, y)[0] as u64).sum();
            sum as f64 / h.max(1) as f64
        })
        .collect()
}

/// Number of text lines in a region, at least 1.
///
/// A line ends wherever the row ink density falls from above
/// `line_ink_threshold` to at or below it.
pub fn count_text_lines(region: &RgbaImage, thresholds: &Thresholds) -> u32 {
    let profile = row_profile(&ink_mask(region));
    let t = thresholds.line_ink_threshold;
    let falls = profile.windows(2).filter(|w| w[0] > t && w[1] <= t).count() as u32;
    falls.max(1)
}

/// Bounding box of the glyphs inside a control body, local to `region`.
///
/// Row and column ink densities are quantized to whole percents. The most
/// common value in each profile is the background level, and indices whose
/// density differs from it are grouped into runs. For a `bordered` control the
/// outermost runs on each axis are the border strokes and are excluded when
/// at least three runs exist.
pub fn locate_ink_bbox(region: &RgbaImage, bordered: bool) -> PixelBox {
    let (w, h) = region.dimensions();
    let mask = ink_mask(region);

    let rows = departing_span(&percent(&row_profile(&mask)), bordered);
    let cols = departing_span(&percent(&column_profile(&mask)), bordered);

    let bbox = match (rows, cols) {
        (Some((ymin, ymax)), Some((xmin, xmax))) => {
            PixelBox::new(ymin as u32, xmin as u32, ymax as u32 + 1, xmax as u32 + 1)
        }
        _ => PixelBox::full(w, h),
    };
    debug!("Ink bbox in {}x{} region (bordered={}): {:?}", w, h, bordered, bbox);
    bbox.clamp_to(w, h)
}

fn percent(profile: &[f64]) -> Vec<u32> {
    profile.iter().map(|v| (v / 255.0 * 100.0).round() as u32).collect()
}

/// Most frequent value. Ties go to the smaller value.
fn mode(values: &[u32]) -> Option<u32> {
    let mut counts = [0usize; 101];
    for &v in values {
        counts[v.min(100) as usize] += 1;
    }
    let max = *counts.iter().max()?;
    if max == 0 {
        return None;
    }
    counts.iter().position(|&c| c == max).map(|i| i as u32)
}

/// Inclusive span of the indices departing from the mode.
fn departing_span(values: &[u32], bordered: bool) -> Option<(usize, usize)> {
    let background = mode(values)?;

    let mut runs: Vec<(usize, usize)> = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v == background {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.1 + 1 == i => run.1 = i,
            _ => runs.push((i, i)),
        }
    }

    match runs.len() {
        0 => None,
        n if bordered && n >= 3 => Some((runs[1].0, runs[n - 2].1)),
        n => Some((runs[0].0, runs[n - 1].1)),
    }
}
