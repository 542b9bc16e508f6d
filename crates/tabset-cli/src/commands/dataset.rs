//! Dataset definition commands

use anyhow::{Context, Result};
use tabset_core::Config;

/// List all dataset definitions
pub async fn list(config_path: &str) -> Result<()> {
    tracing::info!("Listing datasets");

    let config = Config::load(config_path).context("Failed to load configuration")?;
    let datasets = config
        .load_datasets()
        .context("Failed to load dataset definitions")?;

    if datasets.is_empty() {
        println!("No datasets defined");
        return Ok(());
    }

    for dataset in &datasets {
        let input = dataset.input().map_or("-", |i| i.identifier());
        let output = dataset.output().map_or("-", |o| o.identifier());
        println!("{:<24} {} -> {}", dataset.name(), input, output);
    }
    Ok(())
}

/// Show a dataset definition in its wire form
pub async fn show(config_path: &str, name: &str) -> Result<()> {
    tracing::info!("Showing dataset: {}", name);

    let config = Config::load(config_path).context("Failed to load configuration")?;
    let datasets = config
        .load_datasets()
        .context("Failed to load dataset definitions")?;

    let dataset = datasets
        .iter()
        .find(|d| d.name() == name)
        .ok_or_else(|| anyhow::anyhow!("Dataset '{}' not found", name))?;

    let payload = dataset.to_dict()?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
