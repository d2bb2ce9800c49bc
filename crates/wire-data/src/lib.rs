mod config;
mod icons;
mod labels;

pub use config::{defaults, DetectionConfig, OcrConfig, PipelineConfig, Thresholds};
pub use icons::{IconAsset, IconCatalog};
pub use labels::{Category, LabelVocabulary, TextKind};
