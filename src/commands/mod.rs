mod convert;
mod labels;

use anyhow::Result;
use std::path::{Path, PathBuf};
use wire_data::PipelineConfig;

pub use convert::{convert, ConvertArgs};
pub use labels::labels;

/// Locate the data directory: `data/` in the project root when running from
/// `target/<profile>/`, else `./data`.
pub fn resolve_data_dir() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));
    if let Some(dir) = exe_dir {
        let project_root = dir.parent().and_then(|p| p.parent());
        if let Some(root) = project_root {
            let data = root.join("data");
            if data.exists() {
                return data;
            }
        }
    }
    PathBuf::from("data")
}

/// An explicit `--config` must exist. Otherwise `<data_dir>/config.json` is
/// optional.
pub fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<PipelineConfig> {
    match explicit {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Config file {} not found", path.display());
            PipelineConfig::load(path)
        }
        None => PipelineConfig::load(&data_dir.join("config.json")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(load_config(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn test_data_dir_config_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config, PipelineConfig::default());

        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "detection": { "min_score": 0.8 } }"#,
        )
        .unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.detection.min_score, 0.8);
    }
}
