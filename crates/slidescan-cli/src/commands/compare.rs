use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use slidescan_core::catalog::Catalog;
use slidescan_core::compare::{ImageComparator, MeanAbsoluteComparator};
use slidescan_core::consts::{MAX_LEVEL, MOSAIC_JPEG_QUALITY};
use slidescan_core::io::image_io::{load_rgb, save_jpeg};
use slidescan_core::io::layout::OutputLayout;

use crate::summary::print_compare_summary;

#[derive(Args)]
pub struct CompareArgs {
    /// Stitched mosaic to evaluate
    pub image: PathBuf,

    /// Reference image
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Scan output root; without --reference the first L07 tile is the reference
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Write the absolute difference image here
    #[arg(long)]
    pub diff: Option<PathBuf>,
}

pub fn run(args: &CompareArgs) -> Result<()> {
    let reference_path = match (&args.reference, &args.root) {
        (Some(path), _) => path.clone(),
        (None, Some(root)) => coarsest_reference(root)?,
        (None, None) => bail!("either --reference or --root is required"),
    };

    let reference = load_rgb(&reference_path)
        .with_context(|| format!("Failed to read reference {}", reference_path.display()))?;
    let candidate = load_rgb(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let similarity = MeanAbsoluteComparator.compare(&reference, &candidate);

    if let Some(ref diff_path) = args.diff {
        save_jpeg(&similarity.diff, diff_path, MOSAIC_JPEG_QUALITY)
            .with_context(|| format!("Failed to write {}", diff_path.display()))?;
    }

    print_compare_summary(&args.image, &reference_path, &similarity);
    Ok(())
}

/// First catalog record of the coarsest level, L07.
fn coarsest_reference(root: &Path) -> Result<PathBuf> {
    let layout = OutputLayout::new(root);
    let catalog_path = layout.catalog_path();
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;
    let Some(tile) = catalog.level(MAX_LEVEL).next() else {
        bail!("no L0{MAX_LEVEL} tiles in {}; generate levels first", catalog_path.display());
    };
    Ok(layout.tile_path(MAX_LEVEL, &tile.image_name))
}
