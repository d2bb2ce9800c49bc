use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use wire_data::DetectionConfig;

use crate::PixelBox;

/// One detector output as found in a detections file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,
    pub label: String,
    #[serde(default = "default_score")]
    pub score: f64,
    /// Text already recognized upstream for this box, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_score() -> f64 {
    1.0
}

/// A detection in pixel space, clamped to the image it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: PixelBox,
    pub label: String,
    pub score: f64,
    pub text: Option<String>,
}

impl Detection {
    pub fn new(bbox: PixelBox, label: &str, score: f64) -> Self {
        Self {
            bbox,
            label: label.to_string(),
            score,
            text: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

impl RawDetection {
    /// Convert to pixel coordinates. Normalized boxes are scaled by the image size.
    pub fn to_pixels(&self, width: u32, height: u32, normalized: bool) -> Detection {
        let (sx, sy) = if normalized {
            (width as f64, height as f64)
        } else {
            (1.0, 1.0)
        };
        let px = |v: f64, scale: f64| (v * scale).round().max(0.0) as u32;

        let bbox = PixelBox::new(
            px(self.ymin, sy),
            px(self.xmin, sx),
            px(self.ymax, sy),
            px(self.xmax, sx),
        )
        .clamp_to(width, height);

        Detection {
            bbox,
            label: self.label.clone(),
            score: self.score,
            text: self.text.clone(),
        }
    }
}

/// Contents of a detections file.
#[derive(Debug, Clone)]
pub struct DetectionBatch {
    /// Explicit coordinate convention from the file, if it declared one.
    pub normalized: Option<bool>,
    pub detections: Vec<RawDetection>,
}

impl DetectionBatch {
    /// Pixel-space detections. The file's own `normalized` flag wins over `config`.
    pub fn to_pixels(&self, width: u32, height: u32, config: &DetectionConfig) -> Vec<Detection> {
        let normalized = self.normalized.unwrap_or(config.normalized);
        self.detections
            .iter()
            .map(|d| d.to_pixels(width, height, normalized))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionsFile {
    Wrapped {
        #[serde(default)]
        normalized: Option<bool>,
        detections: Vec<RawDetection>,
    },
    Bare(Vec<RawDetection>),
}

/// Load detections from a JSON file: either a bare array or
/// `{ "normalized": bool, "detections": [...] }`.
pub fn load_detections(path: &Path) -> Result<DetectionBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: DetectionsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let batch = match file {
        DetectionsFile::Wrapped {
            normalized,
            detections,
        } => DetectionBatch {
            normalized,
            detections,
        },
        DetectionsFile::Bare(detections) => DetectionBatch {
            normalized: None,
            detections,
        },
    };

    info!(
        "Loaded {} detection(s) from {}",
        batch.detections.len(),
        path.display()
    );
    Ok(batch)
}

/// Drop low-confidence boxes, then greedily suppress overlapping ones.
/// Survivors keep their input order.
pub fn filter_detections(detections: Vec<Detection>, config: &DetectionConfig) -> Vec<Detection> {
    let total = detections.len();
    let scored: Vec<Detection> = detections
        .into_iter()
        .filter(|d| d.score >= config.min_score)
        .collect();

    let keep = nms(&scored, config.iou_threshold, config.per_class_nms);
    let kept: Vec<Detection> = scored
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(_, d)| d)
        .collect();

    debug!(
        "Detection filter: {} in, {} after score >= {:.2} and NMS (iou > {:.2})",
        total,
        kept.len(),
        config.min_score,
        config.iou_threshold
    );
    kept
}

/// Greedy NMS. Returns a keep-flag per input.
fn nms(dets: &[Detection], iou_threshold: f64, per_class: bool) -> Vec<bool> {
    let mut order: Vec<usize> = (0..dets.len()).collect();
    order.sort_by(|&a, &b| {
        dets[b]
            .score
            .partial_cmp(&dets[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; dets.len()];
    let mut keep = vec![false; dets.len()];

    for &i in &order {
        if suppressed[i] {
            continue;
        }
        keep[i] = true;
        for &j in &order {
            if suppressed[j] || keep[j] || i == j {
                continue;
            }
            if per_class && dets[i].label != dets[j].label {
                continue;
            }
            if dets[i].bbox.iou(&dets[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }
    keep
}
