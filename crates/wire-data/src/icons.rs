use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// A stock icon ready to be embedded in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct IconAsset {
    pub data_uri: String,
}

/// Raw icons.json file format
#[derive(Debug, Deserialize)]
struct IconsFile {
    icons: Vec<IconEntry>,
}

#[derive(Debug, Deserialize)]
struct IconEntry {
    label: String,
    file: String,
}

/// Stock icon assets keyed by detector label
#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    icons: HashMap<String, IconAsset>,
}

impl IconCatalog {
    /// Load icon assets from the data directory.
    /// Expects:
    ///   - data_dir/icons.json (label to file mapping)
    ///   - data_dir/icons/{file} (png, jpeg or svg assets)
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut catalog = Self::default();

        let index_path = data_dir.join("icons.json");
        if !index_path.exists() {
            tracing::warn!(
                "No icons.json found at {}. Icons will render as placeholders",
                index_path.display()
            );
            return Ok(catalog);
        }

        let content =
            std::fs::read_to_string(&index_path).context("Failed to read icons.json")?;
        let file: IconsFile =
            serde_json::from_str(&content).context("Failed to parse icons.json")?;

        let icons_dir = data_dir.join("icons");
        for entry in file.icons {
            let path = icons_dir.join(&entry.file);
            let Some(mime) = mime_for(&path) else {
                tracing::warn!("Unsupported icon format for {}: {}", entry.label, entry.file);
                continue;
            };
            match std::fs::read(&path) {
                Ok(bytes) => catalog.insert(&entry.label, mime, &bytes),
                Err(e) => tracing::warn!("Failed to read icon {}: {}", path.display(), e),
            }
        }

        tracing::info!("Loaded {} icons", catalog.len());
        Ok(catalog)
    }

    /// Register an asset from raw bytes.
    pub fn insert(&mut self, label: &str, mime: &str, bytes: &[u8]) {
        let data_uri = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        self.icons.insert(label.to_string(), IconAsset { data_uri });
    }

    pub fn get(&self, label: &str) -> Option<&IconAsset> {
        self.icons.get(label)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
