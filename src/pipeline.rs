use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::info;
use wire_data::{IconCatalog, PipelineConfig};
use wire_detect::{filter_detections, load_detections, Detection};
use wire_export::Format;
use wire_scene::Mockup;
use wire_vision::{DisabledRecognizer, TesseractRecognizer, TextRecognizer};

/// Screenshot plus detections in, wireframe documents out.
pub struct Pipeline {
    config: PipelineConfig,
    catalog: IconCatalog,
    recognizer: Box<dyn TextRecognizer>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        catalog: IconCatalog,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Self {
        Self {
            config,
            catalog,
            recognizer,
        }
    }

    /// Reads text with Tesseract. Fails if the configured command is missing.
    pub fn with_tesseract(config: PipelineConfig, data_dir: &Path) -> Result<Self> {
        let recognizer = TesseractRecognizer::new(&config.ocr).context(
            "Tesseract is unavailable (use --no-ocr when detections carry their text)",
        )?;
        let catalog = IconCatalog::load(data_dir)?;
        Ok(Self::new(config, catalog, Box::new(recognizer)))
    }

    /// Only text carried by the detections is used.
    pub fn without_ocr(config: PipelineConfig, data_dir: &Path) -> Result<Self> {
        let catalog = IconCatalog::load(data_dir)?;
        Ok(Self::new(config, catalog, Box::new(DisabledRecognizer)))
    }

    /// Filter pixel-space detections and run every scene stage up to alignment.
    pub fn build(&self, name: &str, image: RgbaImage, detections: Vec<Detection>) -> Result<Mockup> {
        let detections = filter_detections(detections, &self.config.detection);
        let mut mockup = Mockup::new(name, image, &self.config);
        mockup.classify(&detections, self.recognizer.as_ref())?;
        mockup.reconstruct_background()?;
        mockup.align()?;
        Ok(mockup)
    }

    /// Load the screenshot and its detections file, then build the mockup.
    pub fn load(&self, image_path: &Path, detections_path: &Path, name: &str) -> Result<Mockup> {
        let image = image::open(image_path)
            .with_context(|| format!("Failed to open image {}", image_path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let batch = load_detections(detections_path)?;
        let detections = batch.to_pixels(width, height, &self.config.detection);
        info!(
            "Building '{}' from {}x{} screenshot with {} detection(s)",
            name,
            width,
            height,
            detections.len()
        );
        self.build(name, image, detections)
    }

    /// Write one document per format into `out_dir`.
    pub fn export(&self, mockup: &mut Mockup, formats: &[Format], out_dir: &Path) -> Result<Vec<PathBuf>> {
        formats
            .iter()
            .map(|&format| wire_export::write(mockup, format, &self.catalog, out_dir))
            .collect()
    }

    pub fn convert(
        &self,
        image_path: &Path,
        detections_path: &Path,
        name: &str,
        formats: &[Format],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut mockup = self.load(image_path, detections_path, name)?;
        self.export(&mut mockup, formats, out_dir)
    }
}
