//! Explain an error code

use anyhow::Result;
use tabset_core::ErrorCode;

/// Run the explain command
pub async fn run(code: &str) -> Result<()> {
    let entry = ErrorCode::ALL
        .iter()
        .find(|entry| entry.code().eq_ignore_ascii_case(code))
        .ok_or_else(|| anyhow::anyhow!("Unknown error code '{}'", code))?;

    let category = entry
        .category()
        .map_or_else(|| "Unknown".to_string(), |c| c.to_string());
    println!("{} ({})", entry.code(), category);
    println!("{}", entry.template());
    Ok(())
}
