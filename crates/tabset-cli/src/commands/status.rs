//! Show project status command

use anyhow::{Context, Result};
use tabset_core::Config;

/// Run the status command
pub async fn run(config_path: &str) -> Result<()> {
    tracing::info!("Project status");

    let config = Config::load(config_path).context("Failed to load configuration")?;
    let datasets = config
        .load_datasets()
        .context("Failed to load dataset definitions")?;

    println!("Project:  {} ({})", config.project.name, config.project.version);
    println!("Path:     {}", config.base_path.display());
    println!("Server:   {}", config.project.server.endpoint());
    println!("Datasets: {}", datasets.len());

    let triggered = datasets.iter().filter(|d| d.trigger_by().is_some()).count();
    if triggered > 0 {
        println!("          {} triggered by upstream datasets", triggered);
    }
    Ok(())
}
