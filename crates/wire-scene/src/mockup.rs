use anyhow::{ensure, Result};
use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wire_data::{LabelVocabulary, PipelineConfig, Thresholds};
use wire_detect::{crop_box, Detection, PixelBox};
use wire_vision::{corner_majority, TextRecognizer};

use crate::align::align_elements;
use crate::element::{Element, ElementKind};

/// Where a [`Mockup`] is in its processing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Created,
    Classified,
    PropertiesExtracted,
    BackgroundReconstructed,
    Aligned,
    Serialized,
}

/// Document-level facts every serializer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMeta {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Elements in paint order: background first, then images and icons, then
/// everything text-bearing.
#[derive(Debug)]
pub struct Layers<'a> {
    pub meta: SceneMeta,
    pub elements: Vec<&'a Element>,
}

/// One screenshot being turned into an editable wireframe.
pub struct Mockup {
    id: String,
    name: String,
    original: RgbaImage,
    background: RgbaImage,
    thresholds: Thresholds,
    labels: LabelVocabulary,
    elements: Vec<Element>,
    background_layer: Option<Element>,
    stage: Stage,
}

impl Mockup {
    pub fn new(name: &str, original: RgbaImage, config: &PipelineConfig) -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(12);
        info!(
            "New mockup '{}' ({}), {}x{}",
            name,
            id,
            original.width(),
            original.height()
        );
        Self {
            id,
            name: name.to_string(),
            background: original.clone(),
            original,
            thresholds: config.thresholds.clone(),
            labels: config.labels.clone(),
            elements: Vec::new(),
            background_layer: None,
            stage: Stage::Created,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }

    /// Elements in render order (ascending right edge).
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The original screenshot with every detected element painted out.
    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    pub fn meta(&self) -> SceneMeta {
        let (width, height) = self.dimensions();
        SceneMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            width,
            height,
        }
    }

    fn element_id(&self, index: usize) -> String {
        format!("{}-{}", self.id, index)
    }

    /// Turn detections into extracted elements.
    ///
    /// Unknown labels are skipped. Plain text that reads as blank is dropped.
    /// The survivors are ordered by right edge and numbered from 1 in that
    /// order, id 0 being the background layer.
    pub fn classify(&mut self, detections: &[Detection], ocr: &dyn TextRecognizer) -> Result<()> {
        ensure!(
            self.stage == Stage::Created,
            "classify called on a mockup already at {:?}",
            self.stage
        );
        let (w, h) = self.dimensions();

        let mut pending: Vec<(Element, Option<&str>)> = Vec::new();
        for det in detections {
            let Some(category) = self.labels.categorize(&det.label) else {
                warn!("Unknown label '{}', skipping detection at {:?}", det.label, det.bbox);
                continue;
            };
            let bbox = det.bbox.clamp_to(w, h);
            let id = self.element_id(pending.len() + 1);
            pending.push((Element::new(id, bbox, category, &det.label), det.text.as_deref()));
        }
        self.stage = Stage::Classified;
        debug!("Classified {} of {} detection(s)", pending.len(), detections.len());

        let mut elements = Vec::with_capacity(pending.len());
        for (mut element, preset_text) in pending {
            element.extract_properties(&self.original, ocr, &self.thresholds, preset_text)?;
            if let Some(text) = element.text() {
                if text.kind.is_plain() && text.text.trim().is_empty() {
                    debug!("Discarding blank text at {:?}", element.origin);
                    continue;
                }
            }
            elements.push(element);
        }

        elements.sort_by_key(|e| e.bbox.xmax);
        for (i, element) in elements.iter_mut().enumerate() {
            element.id = self.element_id(i + 1);
        }
        self.elements = elements;
        self.stage = Stage::PropertiesExtracted;
        info!("Extracted {} element(s)", self.elements.len());
        Ok(())
    }

    /// Paint every element out of the background copy, then build the
    /// background layer from it.
    pub fn reconstruct_background(&mut self) -> Result<()> {
        ensure!(
            self.stage == Stage::PropertiesExtracted,
            "reconstruct_background called on a mockup at {:?}",
            self.stage
        );
        let (w, h) = self.dimensions();

        for element in &self.elements {
            if element.origin.is_full_canvas(w, h) {
                debug!("{} covers the whole canvas, leaving background as is", element.id);
                continue;
            }
            let footprint = match &element.kind {
                ElementKind::Text(t) if t.kind.is_plain() => {
                    element.origin.expand(self.thresholds.text_margin, w, h)
                }
                ElementKind::Text(_) => element.origin.expand(self.thresholds.control_margin, w, h),
                ElementKind::Image(_) | ElementKind::Icon(_) => element.origin,
            };
            let color = corner_majority(&crop_box(&self.background, &footprint)).to_rgba();
            fill_box(&mut self.background, &footprint, color);
        }

        self.background_layer = Some(Element::background(
            self.element_id(0),
            self.background.clone(),
        )?);
        self.stage = Stage::BackgroundReconstructed;
        Ok(())
    }

    pub fn align(&mut self) -> Result<()> {
        ensure!(
            self.stage == Stage::BackgroundReconstructed,
            "align called on a mockup at {:?}",
            self.stage
        );
        align_elements(&mut self.elements, &self.thresholds);
        self.stage = Stage::Aligned;
        Ok(())
    }

    /// Everything a serializer draws, in paint order. Can be called again for
    /// each additional output format.
    pub fn layers(&mut self) -> Result<Layers<'_>> {
        ensure!(
            self.stage >= Stage::Aligned,
            "mockup must be aligned before serializing (at {:?})",
            self.stage
        );
        self.stage = Stage::Serialized;

        let meta = self.meta();
        let mut elements: Vec<&Element> = Vec::with_capacity(self.elements.len() + 1);
        elements.extend(self.background_layer.iter());
        elements.extend(self.elements.iter().filter(|e| e.is_image()));
        elements.extend(self.elements.iter().filter(|e| !e.is_image()));
        Ok(Layers { meta, elements })
    }
}

fn fill_box(image: &mut RgbaImage, bbox: &PixelBox, color: image::Rgba<u8>) {
    let b = bbox.clamp_to(image.width(), image.height());
    for y in b.ymin..b.ymax {
        for x in b.xmin..b.xmax {
            image.put_pixel(x, y, color);
        }
    }
}
