use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::ReconstructConfig;
use crate::consts::{DECODE_BATCH_SIZE, MAX_LEVEL};
use crate::error::{Result, SlideScanError};
use crate::io::image_io::{image_dimensions, load_rgb};
use crate::io::layout::OutputLayout;
use crate::progress::{ProgressReporter, Stage};
use crate::tile::{BoundingBox, Tile};

use super::canvas::{allocate_canvas, check_canvas_size, paste};
use super::types::{CancelToken, ReconstructOutcome};

/// Stitch every catalog record of `level` into one canvas.
///
/// Placement comes from the recorded `ImageX`/`ImageY`, scaled by the ratio
/// between the first readable tile's on-disk size and its recorded size. Tiles are
/// pasted in `(row, column)` order without resizing; the last one painted
/// wins where tiles overlap. Missing, unreadable and out-of-bounds tiles are
/// counted as failures and leave the background visible.
pub fn reconstruct_level(
    catalog: &Catalog,
    layout: &OutputLayout,
    level: u8,
    config: &ReconstructConfig,
    reporter: &Arc<dyn ProgressReporter>,
    cancel: &CancelToken,
) -> Result<ReconstructOutcome> {
    if level > MAX_LEVEL {
        return Err(SlideScanError::InvalidLevel(level));
    }

    let mut tiles: Vec<&Tile> = catalog.level(level).collect();
    let (sample, (actual_w, actual_h)) = read_sample(&tiles, layout, level)?;
    let ratio = |actual: u32, recorded: u32| {
        if recorded == 0 {
            1.0
        } else {
            actual as f64 / recorded as f64
        }
    };
    let scale_x = ratio(actual_w, sample.image_width);
    let scale_y = ratio(actual_h, sample.image_height);

    let bbox = BoundingBox::of(tiles.iter().copied()).ok_or(SlideScanError::NoTilesForLevel(level))?;
    let canvas_w = (bbox.width() as f64 * scale_x) as u64;
    let canvas_h = (bbox.height() as f64 * scale_y) as u64;

    info!(
        level,
        tiles = tiles.len(),
        actual_w,
        actual_h,
        recorded_w = sample.image_width,
        scale = scale_x,
        canvas_w,
        canvas_h,
        "Reconstructing level"
    );

    let projected_mb = check_canvas_size(canvas_w, canvas_h, config)?;
    let mut canvas = allocate_canvas(canvas_w as u32, canvas_h as u32, sample.background())?;

    tiles.sort_by_key(|t| (t.row, t.column));
    let total = tiles.len();
    let mut processed = 0;
    let mut failed = 0;

    reporter.begin_stage(Stage::Placing, Some(total));
    for (batch_idx, batch) in tiles.chunks(DECODE_BATCH_SIZE).enumerate() {
        if cancel.is_cancelled() {
            reporter.finish_stage();
            return Err(SlideScanError::Cancelled);
        }

        let decoded: Vec<_> = batch
            .par_iter()
            .map(|t| load_rgb(&layout.tile_path(level, &t.image_name)))
            .collect();

        for (tile, image) in batch.iter().zip(decoded) {
            let image = match image {
                Ok(img) => img,
                Err(e) => {
                    debug!(name = %tile.image_name, error = %e, "Tile not loaded");
                    failed += 1;
                    continue;
                }
            };
            let x = ((tile.image_x - bbox.min_x) as f64 * scale_x) as i64;
            let y = ((tile.image_y - bbox.min_y) as f64 * scale_y) as i64;
            if paste(&mut canvas, &image, x, y) {
                processed += 1;
            } else {
                debug!(name = %tile.image_name, x, y, "Tile outside canvas, skipped");
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
        scale: scale_x,
        projected_mb,
    };
    info!(level, processed, total, failed, "Level reconstructed");
    if outcome.is_partial(config.min_success_rate) {
        warn!(
            level,
            processed,
            total,
            rate = %format!("{:.1}%", outcome.success_rate() * 100.0),
            "Low tile success rate, mosaic is incomplete"
        );
    }
    Ok(outcome)
}

/// First record of the level whose file header can be read, with its on-disk
/// dimensions. Unreadable records before it are left for the placement pass
/// to count as failures.
fn read_sample<'a>(
    tiles: &[&'a Tile],
    layout: &OutputLayout,
    level: u8,
) -> Result<(&'a Tile, (u32, u32))> {
    let mut first_error = None;
    for &tile in tiles {
        match image_dimensions(&layout.tile_path(level, &tile.image_name)) {
            Ok(dims) => return Ok((tile, dims)),
            Err(e) => {
                debug!(name = %tile.image_name, error = %e, "Sample tile not readable");
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(SlideScanError::NoTilesForLevel(level)))
}
