use anyhow::Result;
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};
use tracing::info;
use wire_data::PipelineConfig;
use wire_export::Format;

use crate::pipeline::Pipeline;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Screenshot to rebuild
    pub image: PathBuf,

    /// Detector output for the screenshot (JSON)
    pub detections: PathBuf,

    /// Output format: pencil, svg or balsamiq. Repeat for several.
    #[arg(long = "format", default_value = "svg")]
    pub formats: Vec<Format>,

    /// Directory the documents are written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Document name. Defaults to the image file stem.
    #[arg(long)]
    pub name: Option<String>,

    /// Skip Tesseract and rely on text carried by the detections
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_ocr: bool,
}

impl ConvertArgs {
    fn document_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.image
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "wireframe".to_string())
        })
    }
}

pub fn convert(args: ConvertArgs, config: PipelineConfig, data_dir: &Path) -> Result<()> {
    let pipeline = if args.no_ocr {
        Pipeline::without_ocr(config, data_dir)?
    } else {
        Pipeline::with_tesseract(config, data_dir)?
    };

    let mut formats: Vec<Format> = Vec::new();
    for format in &args.formats {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }

    let written = pipeline.convert(
        &args.image,
        &args.detections,
        &args.document_name(),
        &formats,
        &args.out,
    )?;
    info!("Wrote {} document(s)", written.len());
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(image: &str, name: Option<&str>) -> ConvertArgs {
        ConvertArgs {
            image: PathBuf::from(image),
            detections: PathBuf::from("d.json"),
            formats: vec![Format::Svg],
            out: PathBuf::from("."),
            name: name.map(str::to_string),
            no_ocr: true,
        }
    }

    #[test]
    fn test_document_name() {
        assert_eq!(args("shots/login.png", None).document_name(), "login");
        assert_eq!(args("shots/login.png", Some("Sign in")).document_name(), "Sign in");
    }
}
