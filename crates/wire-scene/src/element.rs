use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;
use wire_data::{Category, TextKind, Thresholds};
use wire_detect::{crop_box, PixelBox};
use wire_vision::{
    count_text_lines, crop_to_content, differentiate, liken, locate_ink_bbox, pad,
    perceptual_distance, remove_borders, sample_background, text_ink_color, HexColor,
    TextRecognizer,
};

/// Colors of a text-bearing element. The ink color is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColors {
    Ink(HexColor),
    Filled { fill: HexColor, text: HexColor },
    Bordered {
        fill: HexColor,
        border: HexColor,
        text: HexColor,
    },
}

impl TextColors {
    pub fn text(&self) -> HexColor {
        match *self {
            TextColors::Ink(text)
            | TextColors::Filled { text, .. }
            | TextColors::Bordered { text, .. } => text,
        }
    }

    pub fn fill(&self) -> Option<HexColor> {
        match *self {
            TextColors::Ink(_) => None,
            TextColors::Filled { fill, .. } | TextColors::Bordered { fill, .. } => Some(fill),
        }
    }

    pub fn border(&self) -> Option<HexColor> {
        match *self {
            TextColors::Bordered { border, .. } => Some(border),
            _ => None,
        }
    }

    pub fn with_text(self, text: HexColor) -> Self {
        match self {
            TextColors::Ink(_) => TextColors::Ink(text),
            TextColors::Filled { fill, .. } => TextColors::Filled { fill, text },
            TextColors::Bordered { fill, border, .. } => TextColors::Bordered { fill, border, text },
        }
    }

    pub fn with_fill(self, fill: HexColor) -> Self {
        match self {
            TextColors::Ink(text) => TextColors::Ink(text),
            TextColors::Filled { text, .. } => TextColors::Filled { fill, text },
            TextColors::Bordered { border, text, .. } => TextColors::Bordered { fill, border, text },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub kind: TextKind,
    pub text: String,
    /// Pixels.
    pub font_size: u32,
    pub colors: TextColors,
    /// Where the glyphs sit inside a control, absolute.
    pub text_area: Option<PixelBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Photo,
    Checkbox,
    Background,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub kind: ImageKind,
    pub image: RgbaImage,
    /// PNG encoding of `image`.
    pub png: Vec<u8>,
    /// `data:image/png;base64,...` form of `png`.
    pub data_uri: String,
}

impl ImageElement {
    fn encode(kind: ImageKind, image: RgbaImage) -> Result<Self> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("Failed to encode PNG")?;
        let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        Ok(Self {
            kind,
            image,
            png,
            data_uri,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconElement {
    /// Detector label, also the key into the icon catalog.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text(TextElement),
    Image(ImageElement),
    Icon(IconElement),
}

/// One reconstructed UI element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    /// Detection footprint on the canvas. Never changes after construction.
    pub origin: PixelBox,
    /// Current geometry, refined by extraction and alignment.
    pub bbox: PixelBox,
    pub kind: ElementKind,
}

impl Element {
    /// A not-yet-extracted element for a categorized detection.
    pub fn new(id: String, bbox: PixelBox, category: Category, label: &str) -> Self {
        let kind = match category {
            Category::Image | Category::Checkbox => {
                let kind = if category == Category::Checkbox {
                    ImageKind::Checkbox
                } else {
                    ImageKind::Photo
                };
                ElementKind::Image(ImageElement {
                    kind,
                    image: RgbaImage::new(0, 0),
                    png: Vec::new(),
                    data_uri: String::new(),
                })
            }
            Category::Icon => ElementKind::Icon(IconElement {
                label: label.to_string(),
            }),
            Category::Text | Category::Input | Category::ButtonRect | Category::ButtonOval => {
                let kind = category.text_kind().unwrap_or(TextKind::Text);
                ElementKind::Text(TextElement {
                    kind,
                    text: String::new(),
                    font_size: 0,
                    colors: TextColors::Ink(HexColor::BLACK),
                    text_area: None,
                })
            }
        };
        Self {
            id,
            origin: bbox,
            bbox,
            kind,
        }
    }

    /// Full-canvas layer holding the reconstructed page background.
    pub fn background(id: String, image: RgbaImage) -> Result<Self> {
        let bbox = PixelBox::full(image.width(), image.height());
        Ok(Self {
            id,
            origin: bbox,
            bbox,
            kind: ElementKind::Image(ImageElement::encode(ImageKind::Background, image)?),
        })
    }

    pub fn text(&self) -> Option<&TextElement> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextElement> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Photos, checkboxes and the background. Icons paint with the text layer.
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image(_))
    }

    /// Measure the element on the source screenshot.
    ///
    /// `preset_text`, when given, is used instead of running `ocr`.
    pub fn extract_properties(
        &mut self,
        source: &RgbaImage,
        ocr: &dyn TextRecognizer,
        thresholds: &Thresholds,
        preset_text: Option<&str>,
    ) -> Result<()> {
        let origin = self.origin;
        match &mut self.kind {
            ElementKind::Text(text) if text.kind.is_plain() => {
                self.bbox = extract_plain_text(text, origin, source, ocr, thresholds, preset_text)?;
            }
            ElementKind::Text(text) => {
                self.bbox = extract_control(text, origin, source, ocr, thresholds, preset_text)?;
            }
            ElementKind::Image(image) => {
                let crop = crop_box(source, &origin);
                let (body, local) = remove_borders(&crop, thresholds.border_noise_floor);
                if let Some(local) = local {
                    self.bbox = origin.absolute(local);
                }
                *image = ImageElement::encode(image.kind, body)?;
            }
            ElementKind::Icon(_) => {}
        }
        Ok(())
    }
}

fn font_size(glyph_height: u32, lines: u32, thresholds: &Thresholds) -> u32 {
    let size = glyph_height as f64 * thresholds.text_height_ratio / lines.max(1) as f64;
    (size.round() as u32).max(1)
}

fn recognize(
    ocr: &dyn TextRecognizer,
    region: &RgbaImage,
    preset_text: Option<&str>,
) -> Result<String> {
    match preset_text {
        Some(text) => Ok(text.to_string()),
        None => ocr.recognize(region),
    }
}

/// Returns the tightened bbox.
fn extract_plain_text(
    text: &mut TextElement,
    origin: PixelBox,
    source: &RgbaImage,
    ocr: &dyn TextRecognizer,
    thresholds: &Thresholds,
    preset_text: Option<&str>,
) -> Result<PixelBox> {
    let crop = crop_box(source, &origin);
    let background = sample_background(&crop);
    let (body, local) = remove_borders(&crop, thresholds.border_noise_floor);
    let bbox = local.map_or(origin, |l| origin.absolute(l));

    let padding = (body.height() as f64 * thresholds.text_padding_ratio) as u32;
    let padded = pad(&body, padding, background);

    let lines = count_text_lines(&padded, thresholds);
    text.font_size = font_size(body.height(), lines, thresholds);
    text.colors = TextColors::Ink(text_ink_color(&padded));
    text.text = recognize(ocr, &padded, preset_text)?;

    debug!(
        "Text at {:?}: {} line(s), {}px, ink {}, '{}'",
        bbox,
        lines,
        text.font_size,
        text.colors.text(),
        text.text
    );
    Ok(bbox)
}

/// Inputs and buttons. Returns the control body's bbox.
fn extract_control(
    text: &mut TextElement,
    origin: PixelBox,
    source: &RgbaImage,
    ocr: &dyn TextRecognizer,
    thresholds: &Thresholds,
    preset_text: Option<&str>,
) -> Result<PixelBox> {
    let crop = crop_box(source, &origin);
    let background = sample_background(&crop);
    let (body, local) = remove_borders(&crop, thresholds.border_noise_floor);
    let bbox = local.map_or(origin, |l| origin.absolute(l));

    let content = crop_to_content(&body, background, bbox, thresholds);
    let edge = HexColor::from_rgba(body.get_pixel(0, body.height() / 2));
    let border_candidate = (perceptual_distance(edge, content.fill) >= thresholds.liken_threshold)
        .then_some(edge);

    let glyph_local = locate_ink_bbox(&content.image, border_candidate.is_some());
    let glyph = crop_box(&content.image, &glyph_local);
    let text_area = content.bbox.absolute(glyph_local);

    let (fill, ink) = differentiate(content.fill, text_ink_color(&glyph), thresholds);
    let outline_only = liken(background, fill, thresholds.liken_threshold).1 == background;
    text.colors = match border_candidate {
        _ if outline_only => TextColors::Bordered {
            fill,
            border: ink,
            text: ink,
        },
        Some(border) if liken(fill, border, thresholds.liken_threshold).1 != fill => {
            TextColors::Bordered {
                fill,
                border,
                text: ink,
            }
        }
        _ => TextColors::Filled { fill, text: ink },
    };

    let padding = (glyph.height() as f64 * thresholds.text_padding_ratio) as u32;
    let padded = pad(&glyph, padding, fill);
    let lines = count_text_lines(&padded, thresholds);
    text.font_size = font_size(glyph.height(), lines, thresholds);
    text.text_area = Some(text_area);
    text.text = recognize(ocr, &padded, preset_text)?;

    debug!(
        "{:?} at {:?}: colors {:?}, text area {:?}, {}px, '{}'",
        text.kind, bbox, text.colors, text_area, text.font_size, text.text
    );
    Ok(bbox)
}
