//! Validate configuration command

use anyhow::{Context, Result};
use std::collections::HashSet;
use tabset_core::Config;

/// Run the validate command
pub async fn run(config_path: &str) -> Result<()> {
    tracing::info!("Validating configuration: {}", config_path);

    let config = Config::load(config_path).context("Failed to load configuration")?;

    tracing::info!("✓ Project: {}", config.project.name);
    tracing::info!("✓ Version: {}", config.project.version);
    tracing::info!("✓ Server: {}", config.project.server.endpoint());

    let datasets = config
        .load_datasets()
        .context("Failed to load dataset definitions")?;

    let names: HashSet<&str> = datasets.iter().map(|d| d.name()).collect();
    if names.len() != datasets.len() {
        anyhow::bail!("Dataset names must be unique within a project");
    }

    for dataset in &datasets {
        tracing::info!("✓ Dataset: {}", dataset.name());
        if let Some(trigger) = dataset.trigger_by()
            && trigger.datastore().is_none()
            && let Some(upstream) = trigger.dataset()
            && !names.contains(upstream)
        {
            tracing::warn!(
                dataset = %dataset.name(),
                trigger = %trigger,
                "Trigger refers to a dataset outside this project"
            );
        }
    }

    tracing::info!("✓ Configuration is valid ({} datasets)", datasets.len());
    Ok(())
}
