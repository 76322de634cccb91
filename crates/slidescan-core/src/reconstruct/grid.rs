//! Catalog-free reconstruction from grid-coded file names.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::Rgb;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ReconstructConfig;
use crate::consts::DECODE_BATCH_SIZE;
use crate::error::{Result, SlideScanError};
use crate::io::image_io::{image_dimensions, load_rgb};
use crate::naming::NameCodec;
use crate::progress::{ProgressReporter, Stage};

use super::canvas::{allocate_canvas, check_canvas_size, paste};
use super::types::{CancelToken, ReconstructOutcome};

/// Tile files of one level keyed by the `(row, column)` in their names.
#[derive(Clone, Debug, Default)]
pub struct GridTileSet {
    level: u8,
    tiles: BTreeMap<(i64, i64), PathBuf>,
}

impl GridTileSet {
    /// Collect every `.jpg` in `dir` whose name `codec` decodes to `level`
    /// with a row and column. Other files are ignored.
    pub fn scan(dir: &Path, level: u8, codec: &dyn NameCodec) -> Result<Self> {
        if !dir.is_dir() {
            return Err(SlideScanError::NoTilesForLevel(level));
        }

        let mut names: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        names.sort();

        let mut tiles = BTreeMap::new();
        for path in names {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match codec.decode(name) {
                Some(fields) if fields.level == level => {
                    if let (Some(row), Some(col)) = (fields.row, fields.column) {
                        tiles.insert((row, col), path);
                    }
                }
                _ => debug!(name, "Not a grid tile of this level, ignored"),
            }
        }

        if tiles.is_empty() {
            return Err(SlideScanError::NoTilesForLevel(level));
        }
        Ok(Self { level, tiles })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// `(min_row, max_row, min_col, max_col)`.
    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        self.tiles.keys().fold(
            (i64::MAX, i64::MIN, i64::MAX, i64::MIN),
            |(r0, r1, c0, c1), &(r, c)| (r0.min(r), r1.max(r), c0.min(c), c1.max(c)),
        )
    }
}

/// Place every tile of `set` at `(row - min_row, col - min_col) * (tile - overlap)`.
///
/// Tile dimensions come from the first tile in `(row, column)` order; tiles of
/// another size are resized to match. Paste order is row-major, so each tile
/// covers the overlap of the one before it.
pub fn reconstruct_grid(
    set: &GridTileSet,
    overlap: u32,
    background: Rgb<u8>,
    config: &ReconstructConfig,
    reporter: &Arc<dyn ProgressReporter>,
    cancel: &CancelToken,
) -> Result<ReconstructOutcome> {
    let entries: Vec<(&(i64, i64), &PathBuf)> = set.tiles.iter().collect();
    let Some((_, sample)) = entries.first() else {
        return Err(SlideScanError::NoTilesForLevel(set.level));
    };

    let (tile_w, tile_h) = image_dimensions(sample)?;
    if overlap >= tile_w.min(tile_h) {
        return Err(SlideScanError::InvalidOverlap {
            overlap,
            tile_size: tile_w.min(tile_h),
        });
    }

    let (min_row, max_row, min_col, max_col) = set.bounds();
    let eff_w = (tile_w - overlap) as u64;
    let eff_h = (tile_h - overlap) as u64;
    let out_w = (max_col - min_col) as u64 * eff_w + tile_w as u64;
    let out_h = (max_row - min_row) as u64 * eff_h + tile_h as u64;

    info!(
        level = set.level,
        grid_rows = max_row - min_row + 1,
        grid_cols = max_col - min_col + 1,
        tile_w,
        tile_h,
        overlap,
        out_w,
        out_h,
        "Reconstructing level from grid names"
    );

    let projected_mb = check_canvas_size(out_w, out_h, config)?;
    info!(megabytes = %format!("{projected_mb:.1}"), "Canvas memory");
    let mut canvas = allocate_canvas(out_w as u32, out_h as u32, background)?;

    let total = entries.len();
    let mut processed = 0;
    let mut failed = 0;

    reporter.begin_stage(Stage::Placing, Some(total));
    for (batch_idx, batch) in entries.chunks(DECODE_BATCH_SIZE).enumerate() {
        if cancel.is_cancelled() {
            reporter.finish_stage();
            return Err(SlideScanError::Cancelled);
        }

        let decoded: Vec<_> = batch
            .par_iter()
            .map(|(_, path)| {
                load_rgb(path).map(|img| {
                    if img.dimensions() == (tile_w, tile_h) {
                        img
                    } else {
                        imageops::resize(&img, tile_w, tile_h, FilterType::Triangle)
                    }
                })
            })
            .collect();

        for ((cell, path), image) in batch.iter().zip(decoded) {
            let (row, col) = **cell;
            let image = match image {
                Ok(img) => img,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Tile not loaded");
                    failed += 1;
                    continue;
                }
            };
            let x = ((col - min_col) as u64 * eff_w) as i64;
            let y = ((row - min_row) as u64 * eff_h) as i64;
            if paste(&mut canvas, &image, x, y) {
                processed += 1;
            } else {
                failed += 1;
            }
        }
        reporter.advance((batch_idx * DECODE_BATCH_SIZE + batch.len()).min(total));
    }
    reporter.finish_stage();

    let outcome = ReconstructOutcome {
        canvas,
        processed,
        total,
        failed,
        scale: 1.0,
        projected_mb,
    };
    info!(level = set.level, processed, total, "Grid level reconstructed");
    if outcome.is_partial(config.min_success_rate) {
        warn!(
            level = set.level,
            processed,
            total,
            rate = %format!("{:.1}%", outcome.success_rate() * 100.0),
            "Low tile success rate, mosaic is incomplete"
        );
    }
    Ok(outcome)
}
