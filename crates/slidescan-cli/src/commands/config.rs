use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use slidescan_core::config::SessionConfig;

use super::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    /// Validate this config and print it with every default filled in
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Write the config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = match args.from {
        Some(ref path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    let text = toml::to_string_pretty(&config).context("Failed to serialize session config")?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!(
                "Session config (step size {} px) saved to {}",
                config.step_size(),
                path.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}
