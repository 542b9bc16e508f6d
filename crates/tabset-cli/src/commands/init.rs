//! Initialize a new Tabset project

use anyhow::Result;
use std::fs;
use std::path::Path;

use tabset_core::config::CONFIG_FILE;

/// Run the init command
pub async fn run(path: &str, name: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    if !project_dir.exists() {
        fs::create_dir_all(project_dir)?;
    }

    let abs_path = project_dir.canonicalize()?;

    // Derive project name from directory name if not provided
    let project_name = match name {
        Some(n) => n.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine project name from path"))?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        anyhow::bail!(
            "Directory '{}' already contains a {}",
            project_dir.display(),
            CONFIG_FILE
        );
    }

    tracing::info!("Creating new Tabset project: {}", project_name);

    fs::create_dir_all(project_dir.join("datasets"))?;

    let config = format!(
        r#"# Tabset Project Configuration
name: {project_name}
version: "0.1.0"

server:
  url: localhost

# Free-form project variables
vars:
  environment: development
"#
    );
    fs::write(project_dir.join(CONFIG_FILE), config)?;

    let raw_events = r#"# Loads newline-delimited JSON exports into the 'events' table
name: raw_events
function: load_events
input:
  localfile-input:
    path: ./data/events.ndjson
output:
  table-output:
    table: events
"#;
    fs::write(project_dir.join("datasets/raw_events.yaml"), raw_events)?;

    let daily_summary = r#"# Re-runs whenever a new version of raw_events lands
name: daily_summary
function: summarize
input:
  table-input:
    uri: td://raw_events/events@HEAD
output:
  table-output:
    table: summary
trigger_by: td://raw_events
"#;
    fs::write(project_dir.join("datasets/daily_summary.yaml"), daily_summary)?;

    fs::create_dir_all(project_dir.join("data"))?;
    let sample_data = r#"{"id": 1, "kind": "signup"}
{"id": 2, "kind": "login"}
"#;
    fs::write(project_dir.join("data/events.ndjson"), sample_data)?;

    let gitignore = r#"# Bundles
*.tar.gz

# IDE
.idea/
.vscode/
*.swp
"#;
    fs::write(project_dir.join(".gitignore"), gitignore)?;

    tracing::info!(
        "✓ Created project '{}' at {}",
        project_name,
        abs_path.display()
    );
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", project_dir.display());
    }
    tracing::info!("  tabset validate       # Check configuration");
    tracing::info!("  tabset dataset list   # Inspect dataset definitions");

    Ok(())
}
