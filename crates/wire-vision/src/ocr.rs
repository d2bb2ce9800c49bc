use anyhow::{bail, Context, Result};
use image::{imageops, RgbaImage};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};
use wire_data::OcrConfig;

use crate::projection::binarize_for_ocr;

/// Turns a cropped text region into a string.
pub trait TextRecognizer {
    fn recognize(&self, region: &RgbaImage) -> Result<String>;
}

/// Recognizer that never reads anything. Used when detections already carry
/// their text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRecognizer;

impl TextRecognizer for DisabledRecognizer {
    fn recognize(&self, _region: &RgbaImage) -> Result<String> {
        Ok(String::new())
    }
}

/// Runs the Tesseract CLI on each region.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: OcrConfig,
    temp_dir: PathBuf,
}

impl TesseractRecognizer {
    /// Fails if the configured command cannot be executed.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let output = Command::new(&config.command)
            .arg("--version")
            .output()
            .with_context(|| format!("Failed to run '{}'", config.command))?;
        if !output.status.success() {
            bail!("'{} --version' exited with {}", config.command, output.status);
        }
        info!("Tesseract OCR available ({})", config.command);

        let temp_dir = std::env::temp_dir().join("wireshot_ocr");
        std::fs::create_dir_all(&temp_dir)
            .with_context(|| format!("Failed to create {}", temp_dir.display()))?;

        Ok(Self {
            config: config.clone(),
            temp_dir,
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &RgbaImage) -> Result<String> {
        if region.width() < 2 || region.height() < 2 {
            return Ok(String::new());
        }

        let processed = preprocess(region, self.config.target_height);
        // removed when dropped at the end of this call
        let temp_file = tempfile::Builder::new()
            .prefix("ocr_")
            .suffix(".png")
            .tempfile_in(&self.temp_dir)
            .with_context(|| format!("Failed to create temp file in {}", self.temp_dir.display()))?;
        let temp_path = temp_file.path();
        processed
            .save(temp_path)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        let output = Command::new(&self.config.command)
            .arg(temp_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.languages)
            .arg("--oem")
            .arg(self.config.oem.to_string())
            .arg("--psm")
            .arg(self.config.psm.to_string())
            .output()
            .with_context(|| format!("Failed to run '{}'", self.config.command))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.config.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR result: '{}'", text);
        Ok(text)
    }
}

/// Binarize dark-on-white and scale to `target_height`, keeping aspect.
fn preprocess(region: &RgbaImage, target_height: u32) -> image::GrayImage {
    let binary = binarize_for_ocr(region);
    let (w, h) = binary.dimensions();
    let target_height = target_height.max(1);
    let target_width = ((w as f64 * target_height as f64 / h as f64).round() as u32).max(1);
    imageops::resize(
        &binary,
        target_width,
        target_height,
        imageops::FilterType::Triangle,
    )
}
