use anyhow::{Context, Result};

use mural_core::config::MuralConfig;

/// Print the effective configuration, writing a default file first if none exists.
pub fn cmd_config(config: &MuralConfig) -> Result<()> {
    let path = MuralConfig::write_default_if_missing().context("failed to write default config")?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
