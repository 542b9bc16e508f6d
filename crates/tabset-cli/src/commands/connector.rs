//! Connector inspection commands

use anyhow::{Context, Result};
use serde_json::Value;
use tabset_core::connectors::{INPUT_IDENTIFIERS, OUTPUT_IDENTIFIERS};
use tabset_core::{build_input, build_output};

/// Validate a connector file and print its canonical form
pub async fn show(file: &str) -> Result<()> {
    tracing::info!("Reading connector: {}", file);

    let contents =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
    // JSON documents are valid YAML
    let value: Value = serde_yaml::from_str(&contents).context("Failed to parse connector")?;

    let identifier = value
        .as_object()
        .and_then(|object| object.keys().next())
        .cloned()
        .unwrap_or_default();

    let canonical = if OUTPUT_IDENTIFIERS.contains(&identifier.as_str()) {
        build_output(&value)?.map(|output| output.to_dict())
    } else if INPUT_IDENTIFIERS.contains(&identifier.as_str()) {
        build_input(&value)?.map(|input| input.to_dict()).transpose()?
    } else {
        anyhow::bail!(
            "Unknown connector '{}'. Supported connectors are: {}",
            identifier,
            INPUT_IDENTIFIERS
                .iter()
                .chain(OUTPUT_IDENTIFIERS.iter())
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let canonical = canonical.unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&canonical)?);
    Ok(())
}

/// List supported connector identifiers
pub async fn list() -> Result<()> {
    println!("Inputs:");
    for identifier in INPUT_IDENTIFIERS {
        println!("  {}", identifier);
    }
    println!("Outputs:");
    for identifier in OUTPUT_IDENTIFIERS {
        println!("  {}", identifier);
    }
    Ok(())
}
