use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use slidescan_core::catalog::Catalog;
use slidescan_core::config::ReconstructConfig;
use slidescan_core::io::image_io::save_mosaic;
use slidescan_core::io::layout::OutputLayout;
use slidescan_core::naming::GridCodec;
use slidescan_core::progress::{ProgressReporter, Stage};
use slidescan_core::reconstruct::{
    reconstruct_grid, reconstruct_level, CancelToken, GridTileSet, ReconstructOutcome,
};
use slidescan_core::tile::default_background_pixel;
use tracing::warn;

use super::load_config;
use crate::progress::BarReporter;
use crate::summary::print_stitch_summary;

#[derive(Args)]
pub struct StitchArgs {
    /// Scan output root (contains Blocks/ and Data/)
    pub root: PathBuf,

    /// Level to stitch (0 = full resolution, 7 = coarsest)
    #[arg(short, long, default_value = "1")]
    pub level: u8,

    /// Place tiles from grid-coded file names instead of the catalog
    #[arg(long)]
    pub grid: bool,

    /// Overlap between neighbouring tiles in pixels (grid mode)
    #[arg(long, default_value = "0")]
    pub overlap: u32,

    /// Session config file (TOML); only the reconstruct table is used
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &StitchArgs) -> Result<()> {
    let config = match args.config {
        Some(ref path) => load_config(path)?.reconstruct,
        None => ReconstructConfig::default(),
    };
    let layout = OutputLayout::new(&args.root);
    let output = args.output.clone().unwrap_or_else(|| {
        args.root.join(format!("L0{}_stitched.jpg", args.level))
    });

    let reporter: Arc<dyn ProgressReporter> = Arc::new(BarReporter::new());
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || on_interrupt.cancel()) {
        warn!(error = %e, "Ctrl-C handler not installed, stitching cannot be interrupted");
    }

    let outcome = if args.grid {
        stitch_grid(args, &layout, &config, &reporter, &cancel)?
    } else {
        let catalog_path = layout.catalog_path();
        let catalog = Catalog::load(&catalog_path)
            .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;
        reconstruct_level(&catalog, &layout, args.level, &config, &reporter, &cancel)
            .with_context(|| format!("Failed to stitch level {}", args.level))?
    };

    reporter.begin_stage(Stage::Saving, None);
    let saved = save_mosaic(&outcome.canvas, &output, config.max_dimension, config.quality);
    reporter.finish_stage();
    let saved = saved.with_context(|| format!("Failed to save mosaic {}", output.display()))?;

    print_stitch_summary(args.level, &outcome, &saved, config.min_success_rate);
    Ok(())
}

fn stitch_grid(
    args: &StitchArgs,
    layout: &OutputLayout,
    config: &ReconstructConfig,
    reporter: &Arc<dyn ProgressReporter>,
    cancel: &CancelToken,
) -> Result<ReconstructOutcome> {
    let dir = layout.level_dir(args.level);
    let set = GridTileSet::scan(&dir, args.level, &GridCodec)
        .with_context(|| format!("Failed to collect grid tiles in {}", dir.display()))?;
    println!("Found {} grid tiles in {}", set.len(), dir.display());

    reconstruct_grid(
        &set,
        args.overlap,
        default_background_pixel(),
        config,
        reporter,
        cancel,
    )
    .with_context(|| format!("Failed to stitch level {} from grid names", args.level))
}
