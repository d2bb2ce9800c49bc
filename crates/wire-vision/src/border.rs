use image::{imageops, RgbaImage};
use std::collections::HashMap;
use tracing::debug;
use wire_data::Thresholds;
use wire_detect::{crop_box, PixelBox};

use crate::color::{dominant_color, perceptual_distance, HexColor};

/// Local bounding box of everything that differs from the top-left pixel by
/// more than `noise_floor` on some channel. `None` for a uniform region.
pub fn detect_border(region: &RgbaImage, noise_floor: u8) -> Option<PixelBox> {
    let (w, h) = region.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let corner = *region.get_pixel(0, 0);

    let mut bbox: Option<PixelBox> = None;
    for (x, y, px) in region.enumerate_pixels() {
        let differs = (0..3).any(|c| px[c].abs_diff(corner[c]) > noise_floor);
        if !differs {
            continue;
        }
        bbox = Some(match bbox {
            None => PixelBox::new(y, x, y + 1, x + 1),
            Some(b) => PixelBox::new(
                b.ymin.min(y),
                b.xmin.min(x),
                b.ymax.max(y + 1),
                b.xmax.max(x + 1),
            ),
        });
    }
    bbox
}

/// Strip the margin around a detection's content. Returns the cropped image
/// and the local box it was cut from, or the input untouched when nothing
/// stands out.
pub fn remove_borders(region: &RgbaImage, noise_floor: u8) -> (RgbaImage, Option<PixelBox>) {
    match detect_border(region, noise_floor) {
        Some(bbox) => (crop_box(region, &bbox), Some(bbox)),
        None => (region.clone(), None),
    }
}

/// Interior of a control once its fill and the page background are peeled off.
#[derive(Debug, Clone)]
pub struct Content {
    pub image: RgbaImage,
    pub fill: HexColor,
    /// Absolute coordinates of `image` on the canvas.
    pub bbox: PixelBox,
}

/// Shrink `region` from every edge while the outermost row or column holds only
/// fill-colored or background-colored pixels.
///
/// `origin` is where `region` sits on the canvas. The returned box is in the
/// same absolute coordinates.
pub fn crop_to_content(
    region: &RgbaImage,
    background: HexColor,
    origin: PixelBox,
    thresholds: &Thresholds,
) -> Content {
    let fill = dominant_color(region, 0, thresholds);
    let (w, h) = region.dimensions();

    let mut plain: HashMap<HexColor, bool> = HashMap::new();
    let mut is_plain = |x: u32, y: u32| {
        let c = HexColor::from_rgba(region.get_pixel(x, y));
        *plain.entry(c).or_insert_with(|| {
            perceptual_distance(c, fill) < thresholds.liken_threshold
                || perceptual_distance(c, background) < thresholds.liken_threshold
        })
    };

    let (mut top, mut bottom, mut left, mut right) = (0u32, h, 0u32, w);
    while top < bottom && (left..right).all(|x| is_plain(x, top)) {
        top += 1;
    }
    while bottom > top && (left..right).all(|x| is_plain(x, bottom - 1)) {
        bottom -= 1;
    }
    while left < right && (top..bottom).all(|y| is_plain(left, y)) {
        left += 1;
    }
    while right > left && (top..bottom).all(|y| is_plain(right - 1, y)) {
        right -= 1;
    }

    let local = if top >= bottom || left >= right {
        debug!("Uniform control body, keeping the whole {}x{} region", w, h);
        PixelBox::full(w, h)
    } else {
        PixelBox::new(top, left, bottom, right)
    };

    Content {
        image: crop_box(region, &local),
        fill,
        bbox: origin.absolute(local),
    }
}

/// Surround a region with `size` pixels of a constant color.
pub fn pad(region: &RgbaImage, size: u32, color: HexColor) -> RgbaImage {
    let (w, h) = region.dimensions();
    let mut padded = RgbaImage::from_pixel(w + 2 * size, h + 2 * size, color.to_rgba());
    imageops::replace(&mut padded, region, size as i64, size as i64);
    padded
}
