use image::RgbaImage;
use serde::{Deserialize, Serialize};

mod detections;

pub use detections::{filter_detections, load_detections, Detection, DetectionBatch, RawDetection};

/// Axis-aligned pixel rectangle. `xmax`/`ymax` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub ymin: u32,
    pub xmin: u32,
    pub ymax: u32,
    pub xmax: u32,
}

impl PixelBox {
    pub fn new(ymin: u32, xmin: u32, ymax: u32, xmax: u32) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    /// The whole canvas.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, height, width)
    }

    pub fn width(&self) -> u32 {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> u32 {
        self.ymax.saturating_sub(self.ymin)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Clamp into a `width` x `height` canvas, keeping at least a 1px extent.
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let xmin = self.xmin.min(width.saturating_sub(1));
        let ymin = self.ymin.min(height.saturating_sub(1));
        let xmax = self.xmax.min(width).max(xmin + 1);
        let ymax = self.ymax.min(height).max(ymin + 1);
        Self::new(ymin, xmin, ymax, xmax)
    }

    /// Grow by `margin` on every side without leaving the canvas.
    pub fn expand(self, margin: u32, width: u32, height: u32) -> Self {
        Self::new(
            self.ymin.saturating_sub(margin),
            self.xmin.saturating_sub(margin),
            self.ymax.saturating_add(margin),
            self.xmax.saturating_add(margin),
        )
        .clamp_to(width, height)
    }

    /// Translate a box expressed relative to this one into absolute coordinates.
    pub fn absolute(&self, local: PixelBox) -> Self {
        Self::new(
            self.ymin + local.ymin,
            self.xmin + local.xmin,
            (self.ymin + local.ymax).min(self.ymax),
            (self.xmin + local.xmax).min(self.xmax),
        )
    }

    /// Shift by a signed offset, saturating at zero.
    pub fn offset(self, dy: i64, dx: i64) -> Self {
        let shift = |v: u32, d: i64| (v as i64 + d).clamp(0, u32::MAX as i64) as u32;
        Self::new(
            shift(self.ymin, dy),
            shift(self.xmin, dx),
            shift(self.ymax, dy),
            shift(self.xmax, dx),
        )
    }

    /// Clamp inside `outer`, keeping at least a 1px extent.
    pub fn clamp_within(self, outer: PixelBox) -> Self {
        let ymin = self.ymin.clamp(outer.ymin, outer.ymax.saturating_sub(1).max(outer.ymin));
        let xmin = self.xmin.clamp(outer.xmin, outer.xmax.saturating_sub(1).max(outer.xmin));
        let ymax = self.ymax.min(outer.ymax).max(ymin + 1);
        let xmax = self.xmax.min(outer.xmax).max(xmin + 1);
        Self::new(ymin, xmin, ymax, xmax)
    }

    pub fn is_full_canvas(&self, width: u32, height: u32) -> bool {
        self.xmin == 0 && self.ymin == 0 && self.xmax >= width && self.ymax >= height
    }

    pub fn contains_box(&self, other: &PixelBox) -> bool {
        other.xmin >= self.xmin
            && other.ymin >= self.ymin
            && other.xmax <= self.xmax
            && other.ymax <= self.ymax
    }

    /// Intersection over union.
    pub fn iou(&self, other: &PixelBox) -> f64 {
        let ix1 = self.xmin.max(other.xmin);
        let iy1 = self.ymin.max(other.ymin);
        let ix2 = self.xmax.min(other.xmax);
        let iy2 = self.ymax.min(other.ymax);

        let inter = ix2.saturating_sub(ix1) as f64 * iy2.saturating_sub(iy1) as f64;
        let union = self.area() as f64 + other.area() as f64 - inter;

        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// Crop a box from an image. The box is clamped to the image first, so the
/// result is never smaller than 1x1.
pub fn crop_box(image: &RgbaImage, bbox: &PixelBox) -> RgbaImage {
    let b = bbox.clamp_to(image.width(), image.height());
    image::imageops::crop_imm(image, b.xmin, b.ymin, b.width(), b.height()).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_degenerate_box() {
        let b = PixelBox::new(50, 80, 50, 60).clamp_to(100, 100);
        assert_eq!(b.width(), 1);
        assert_eq!(b.height(), 1);

        let b = PixelBox::new(120, 130, 140, 150).clamp_to(100, 100);
        assert_eq!(b, PixelBox::new(99, 99, 100, 100));
    }

    #[test]
    fn test_expand_stays_inside() {
        let b = PixelBox::new(1, 2, 10, 98).expand(3, 100, 50);
        assert_eq!(b, PixelBox::new(0, 0, 13, 100));
    }

    #[test]
    fn test_absolute() {
        let outer = PixelBox::new(10, 20, 60, 120);
        let inner = outer.absolute(PixelBox::new(5, 5, 15, 50));
        assert_eq!(inner, PixelBox::new(15, 25, 25, 70));
        assert!(outer.contains_box(&inner));
    }

    #[test]
    fn test_offset() {
        let b = PixelBox::new(10, 10, 20, 30).offset(-15, 5);
        assert_eq!(b, PixelBox::new(0, 15, 5, 35));
    }

    #[test]
    fn test_clamp_within() {
        let outer = PixelBox::new(20, 130, 50, 230);
        assert_eq!(
            PixelBox::new(45, 120, 60, 210).clamp_within(outer),
            PixelBox::new(45, 130, 50, 210)
        );
        // entirely below the outer box
        assert_eq!(
            PixelBox::new(70, 150, 80, 160).clamp_within(outer),
            PixelBox::new(49, 150, 50, 160)
        );
    }

    #[test]
    fn test_iou() {
        let a = PixelBox::new(0, 0, 10, 10);
        let b = PixelBox::new(0, 5, 10, 15);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-9);
        assert_eq!(a.iou(&PixelBox::new(20, 20, 30, 30)), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_box() {
        let img = RgbaImage::new(1920, 1080);
        let cropped = crop_box(&img, &PixelBox::new(540, 960, 648, 1152));
        assert_eq!(cropped.width(), 192);
        assert_eq!(cropped.height(), 108);

        let cropped = crop_box(&img, &PixelBox::new(1000, 1900, 1000, 1900));
        assert_eq!(cropped.dimensions(), (1, 1));
    }
}
