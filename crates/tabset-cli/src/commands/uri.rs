//! URI inspection commands

use anyhow::{Context, Result};
use serde_json::json;
use tabset_core::{Versions, build_uri_object, build_version_object};

/// Parse a URI and print its components as JSON
pub async fn parse(uri: &str) -> Result<()> {
    tracing::debug!("Parsing URI: {}", uri);
    let parsed = build_uri_object(uri).context("Invalid URI")?;

    let components = json!({
        "uri": parsed.to_string(),
        "datastore": parsed.datastore(),
        "dataset": parsed.dataset(),
        "table": parsed.table(),
        "version": parsed.version().map(ToString::to_string),
        "version_kind": parsed.version().map(Versions::kind),
    });
    println!("{}", serde_json::to_string_pretty(&components)?);
    Ok(())
}

/// Parse a version qualifier and print its kind and canonical form
pub async fn version(token: &str) -> Result<()> {
    tracing::debug!("Parsing version: {}", token);
    let versions = build_version_object(token).context("Invalid version")?;

    println!("{}: {}", versions.kind(), versions);
    if let Versions::Range(range) = &versions {
        println!("  from: {}", range.initial());
        println!("  to:   {}", range.last());
    }
    Ok(())
}
