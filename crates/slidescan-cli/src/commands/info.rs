use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use slidescan_core::acquire::ScanMap;
use slidescan_core::catalog::Catalog;
use slidescan_core::io::layout::{level_dir_name, OutputLayout};
use slidescan_core::reconstruct::canvas::projected_megabytes;
use slidescan_core::tile::BoundingBox;

#[derive(Args)]
pub struct InfoArgs {
    /// Scan output root (contains Blocks/ and Data/)
    pub root: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let layout = OutputLayout::new(&args.root);
    let catalog_path = layout.catalog_path();
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;

    println!("Catalog:     {}", catalog_path.display());
    println!("Tiles:       {}", catalog.len());

    let scan_map = ScanMap::from_catalog(&catalog);
    if let Some(bounds) = scan_map.bounds() {
        println!(
            "Grid:        rows {}..={}, cols {}..={}",
            bounds.min_row, bounds.max_row, bounds.min_col, bounds.max_col
        );
        println!(
            "Coverage:    {} cells ({:.1}% of {}x{})",
            scan_map.len(),
            scan_map.coverage() * 100.0,
            bounds.rows(),
            bounds.cols()
        );
    }
    println!();

    println!("Level  Tiles   Extent             Canvas");
    for (level, count) in catalog.level_counts() {
        let Some(bbox) = BoundingBox::of(catalog.level(level)) else {
            continue;
        };
        println!(
            "{:<6} {:<7} {:<18} {:.1} MB",
            level_dir_name(level),
            count,
            format!("{}x{}", bbox.width(), bbox.height()),
            projected_megabytes(bbox.width(), bbox.height())
        );
    }

    Ok(())
}
