use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::labels::LabelVocabulary;

/// Empirically tuned constants. `Thresholds::default()` is built from these.
pub mod defaults {
    /// Per-channel difference from the corner pixel below which a pixel counts as background.
    pub const BORDER_NOISE_FLOOR: u8 = 100;
    /// Row-average ink intensity (0-255) under which a row counts as a gap between lines.
    pub const LINE_INK_THRESHOLD: f64 = 2.0;
    /// Font size in px per px of measured glyph height.
    pub const TEXT_HEIGHT_RATIO: f64 = 1.1;
    /// Padding added around tight text crops, as a fraction of their height.
    pub const TEXT_PADDING_RATIO: f64 = 0.2;
    /// Below this many pixels, dominant colors are clustered before ranking.
    pub const CLUSTER_POPULATION: usize = 1024;
    pub const CLUSTER_BIN: u8 = 16;
    /// CIE76 delta E under which two colors are collapsed to one.
    pub const LIKEN_THRESHOLD: f64 = 10.0;
    /// CIE76 delta E under which fill and text are considered unreadable.
    pub const DIFFERENTIATE_THRESHOLD: f64 = 20.0;
    pub const DIFFERENTIATE_MARGIN: f64 = 30.0;
    pub const LIGHTNESS_STEP: f64 = 4.0;
    pub const ALIGN_MAX_GAP: u32 = 150;
    pub const FONT_RATIO_MIN: f64 = 0.7;
    pub const FONT_RATIO_MAX: f64 = 1.3;
    /// Allowed top-edge drift for a row continuation, as a fraction of the reference height.
    pub const ROW_TOLERANCE: f64 = 0.5;
    pub const COLUMN_TOLERANCE: u32 = 8;
    pub const FONT_HARMONIZE_PX: u32 = 2;
    /// Extra pixels erased around plain text when patching the background.
    pub const TEXT_MARGIN: u32 = 3;
    /// Extra pixels erased around inputs and buttons when patching the background.
    pub const CONTROL_MARGIN: u32 = 1;
}

/// Every tunable number used by the extraction, reconciliation and alignment passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub border_noise_floor: u8,
    pub line_ink_threshold: f64,
    pub text_height_ratio: f64,
    pub text_padding_ratio: f64,
    pub cluster_population: usize,
    pub cluster_bin: u8,
    pub liken_threshold: f64,
    pub differentiate_threshold: f64,
    pub differentiate_margin: f64,
    pub lightness_step: f64,
    pub align_max_gap: u32,
    pub font_ratio_min: f64,
    pub font_ratio_max: f64,
    pub row_tolerance: f64,
    pub column_tolerance: u32,
    pub font_harmonize_px: u32,
    pub text_margin: u32,
    pub control_margin: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        use defaults::*;
        Self {
            border_noise_floor: BORDER_NOISE_FLOOR,
            line_ink_threshold: LINE_INK_THRESHOLD,
            text_height_ratio: TEXT_HEIGHT_RATIO,
            text_padding_ratio: TEXT_PADDING_RATIO,
            cluster_population: CLUSTER_POPULATION,
            cluster_bin: CLUSTER_BIN,
            liken_threshold: LIKEN_THRESHOLD,
            differentiate_threshold: DIFFERENTIATE_THRESHOLD,
            differentiate_margin: DIFFERENTIATE_MARGIN,
            lightness_step: LIGHTNESS_STEP,
            align_max_gap: ALIGN_MAX_GAP,
            font_ratio_min: FONT_RATIO_MIN,
            font_ratio_max: FONT_RATIO_MAX,
            row_tolerance: ROW_TOLERANCE,
            column_tolerance: COLUMN_TOLERANCE,
            font_harmonize_px: FONT_HARMONIZE_PX,
            text_margin: TEXT_MARGIN,
            control_margin: CONTROL_MARGIN,
        }
    }
}

/// How the external Tesseract binary is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Executable name or absolute path.
    pub command: String,
    pub languages: String,
    pub oem: u8,
    pub psm: u8,
    /// Crops are rescaled to this height before recognition.
    pub target_height: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            languages: "eng+fra".to_string(),
            oem: 1,
            psm: 3,
            target_height: 60,
        }
    }
}

/// Post-processing applied to raw detector output before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_score: f64,
    pub iou_threshold: f64,
    /// Only suppress overlapping boxes that share a label.
    pub per_class_nms: bool,
    /// Box coordinates are fractions of the image size rather than pixels.
    pub normalized: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_score: 0.4,
            iou_threshold: 0.1,
            per_class_nms: false,
            normalized: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub thresholds: Thresholds,
    pub ocr: OcrConfig,
    pub detection: DetectionConfig,
    pub labels: LabelVocabulary,
}

impl PipelineConfig {
    /// Load a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "No config found at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!(
            "Loaded config from {} ({} labels)",
            path.display(),
            config.labels.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent() {
        let config = PipelineConfig::load(Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "thresholds": { "align_max_gap": 90 }, "ocr": { "command": "/opt/tesseract" } }"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.thresholds.align_max_gap, 90);
        assert_eq!(
            config.thresholds.liken_threshold,
            defaults::LIKEN_THRESHOLD
        );
        assert_eq!(config.ocr.command, "/opt/tesseract");
        assert_eq!(config.ocr.languages, "eng+fra");
        assert!(!config.labels.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(PipelineConfig::load(&path).is_err());
    }
}
