use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use slidescan_core::catalog::Catalog;
use slidescan_core::config::SessionConfig;
use slidescan_core::io::layout::OutputLayout;
use slidescan_core::progress::ProgressReporter;
use slidescan_core::pyramid::generate_levels;

use super::load_config;
use crate::progress::BarReporter;
use crate::summary::print_levels_summary;

#[derive(Args)]
pub struct LevelsArgs {
    /// Scan output root (contains Blocks/ and Data/)
    pub root: PathBuf,

    /// Session config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Coarsest level to generate (1-7)
    #[arg(long)]
    pub levels: Option<u8>,

    /// Worker threads for re-tiling (0 = all cores)
    #[arg(long)]
    pub workers: Option<usize>,
}

pub fn run(args: &LevelsArgs) -> Result<()> {
    let layout = OutputLayout::new(&args.root);
    let catalog_path = layout.catalog_path();
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;

    let mut config = match args.config {
        Some(ref path) => load_config(path)?,
        None => config_from_catalog(&catalog),
    };
    config.output = args.root.clone();
    if let Some(levels) = args.levels {
        config.pyramid.levels = levels;
    }
    if let Some(workers) = args.workers {
        config.pyramid.workers = workers;
    }
    config.validate().context("Invalid level settings")?;

    let reporter: Arc<dyn ProgressReporter> = Arc::new(BarReporter::new());
    let all = generate_levels(&catalog, &layout, &config, &reporter)
        .context("Pyramid generation failed")?;
    all.save(&catalog_path)
        .with_context(|| format!("Failed to write catalog {}", catalog_path.display()))?;

    print_levels_summary(&all);
    Ok(())
}

/// Defaults, with the tile size taken from the level-0 records.
fn config_from_catalog(catalog: &Catalog) -> SessionConfig {
    let mut config = SessionConfig::default();
    if let Some(tile) = catalog.level(0).next() {
        config.tile_size = tile.image_width;
    }
    config
}
