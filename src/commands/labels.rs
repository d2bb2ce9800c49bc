use anyhow::{Context, Result};
use wire_data::PipelineConfig;

pub fn labels(config: &PipelineConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(&config.labels)
        .context("Failed to serialize label vocabulary")?;
    println!("{}", json);
    Ok(())
}
