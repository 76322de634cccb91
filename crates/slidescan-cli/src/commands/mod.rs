pub mod compare;
pub mod config;
pub mod info;
pub mod levels;
pub mod scan;
pub mod stitch;

use std::path::Path;

use anyhow::{Context, Result};
use slidescan_core::config::SessionConfig;

/// Read a TOML session config.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: SessionConfig = toml::from_str(&contents).context("Invalid session config")?;
    config.validate().context("Invalid session config")?;
    Ok(config)
}
