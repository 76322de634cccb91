use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::SessionConfig;
use crate::consts::{DECODE_BATCH_SIZE, LEVEL_INDEX_SHIFT};
use crate::error::{Result, SlideScanError};
use crate::io::image_io::{load_rgb, save_jpeg};
use crate::io::layout::OutputLayout;
use crate::naming::NameCodec;
use crate::progress::{ProgressReporter, Stage};
use crate::reconstruct::canvas::{allocate_canvas, check_canvas_size, paste};
use crate::tile::{default_background_pixel, BoundingBox, Tile, TileKey};

use super::resize::downscale_area;

/// One block of a downscaled level, before its pixels are cut out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelCell {
    /// Position of the block in the level's retiling grid. Skipped edge
    /// fragments still consume a row or column number.
    pub row: i64,
    pub column: i64,
    pub x: u32,
    pub y: u32,
    /// Size of the fragment inside the level canvas (at most one tile).
    pub width: u32,
    pub height: u32,
    /// Sequential number among the kept cells of this level.
    pub index: u64,
}

/// Retiling plan for a `width x height` level canvas.
///
/// Blocks start every `step` pixels. Edge fragments narrower or shorter than
/// half a tile are dropped; every other fragment is later resized to a full
/// tile.
pub fn plan_level(width: u32, height: u32, tile_size: u32, step: u32) -> Vec<LevelCell> {
    let step = step.max(1) as usize;
    let half = tile_size / 2;
    let mut cells = Vec::new();
    let mut index = 0;

    for (row, y) in (0..height).step_by(step).enumerate() {
        for (column, x) in (0..width).step_by(step).enumerate() {
            let w = tile_size.min(width - x);
            let h = tile_size.min(height - y);
            if (w, h) != (tile_size, tile_size) && (w < half || h < half) {
                continue;
            }
            cells.push(LevelCell {
                row: row as i64,
                column: column as i64,
                x,
                y,
                width: w,
                height: h,
                index,
            });
            index += 1;
        }
    }
    cells
}

/// Build levels `1..=config.pyramid.levels` from the level-0 records of
/// `catalog` and return a catalog holding every level.
///
/// Level 0 is composed onto one canvas spanning the true bounding box of its
/// tiles (later records painted last), then each level `L` is an area-average
/// downscale by `2^L` cut into tiles of the level-0 size. Level coordinates
/// are relative to the level-0 bounding box origin. The caller persists the
/// returned catalog.
pub fn generate_levels(
    catalog: &Catalog,
    layout: &OutputLayout,
    config: &SessionConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<Catalog> {
    let base: Vec<Tile> = catalog.level(0).cloned().collect();
    let bbox = BoundingBox::of(&base).ok_or(SlideScanError::EmptyCatalog)?;

    let workers = config.pyramid.workers;
    if workers == 0 {
        return build_all_levels(&base, &bbox, layout, config, reporter);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| SlideScanError::InvalidConfig(format!("worker pool: {e}")))?;
    pool.install(|| build_all_levels(&base, &bbox, layout, config, reporter))
}

fn build_all_levels(
    base: &[Tile],
    bbox: &BoundingBox,
    layout: &OutputLayout,
    config: &SessionConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<Catalog> {
    let composed = compose_base(base, bbox, layout, config, reporter)?;
    let codec = config.naming.codec();
    let step = config.step_size();

    let mut all = base.to_vec();
    for level in 1..=config.pyramid.levels {
        let factor = 1u64 << level;
        let new_w = (bbox.width() / factor) as u32;
        let new_h = (bbox.height() / factor) as u32;
        if new_w == 0 || new_h == 0 {
            warn!(level, "Level canvas is empty, no tiles generated");
            continue;
        }

        reporter.begin_stage(Stage::Downscaling, None);
        let scaled = downscale_area(&composed, new_w, new_h)?;
        reporter.finish_stage();

        fs::create_dir_all(layout.level_dir(level))?;
        let cells = plan_level(new_w, new_h, config.tile_size, step);
        let tiles = retile_level(&scaled, level, &cells, layout, config, codec, reporter)?;
        info!(level, width = new_w, height = new_h, tiles = tiles.len(), "Generated level");
        all.extend(tiles);
    }

    Ok(Catalog::from_tiles(all))
}

/// Paste every level-0 tile onto one canvas covering `bbox`.
fn compose_base(
    base: &[Tile],
    bbox: &BoundingBox,
    layout: &OutputLayout,
    config: &SessionConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<RgbImage> {
    let (w, h) = (bbox.width(), bbox.height());
    check_canvas_size(w, h, &config.reconstruct)?;
    let mut canvas = allocate_canvas(w as u32, h as u32, default_background_pixel())?;
    info!(width = w, height = h, tiles = base.len(), "Composing level 0");

    reporter.begin_stage(Stage::Composing, Some(base.len()));
    for (batch_idx, batch) in base.chunks(DECODE_BATCH_SIZE).enumerate() {
        let decoded: Vec<_> = batch
            .par_iter()
            .map(|t| load_rgb(&layout.tile_path(0, &t.image_name)))
            .collect();

        for (tile, image) in batch.iter().zip(decoded) {
            match image {
                Ok(img) => {
                    let x = tile.image_x - bbox.min_x;
                    let y = tile.image_y - bbox.min_y;
                    if !paste(&mut canvas, &img, x, y) {
                        debug!(name = %tile.image_name, "Level-0 tile outside bounds, skipped");
                    }
                }
                Err(e) => warn!(name = %tile.image_name, error = %e, "Level-0 tile not loaded"),
            }
        }
        reporter.advance(batch_idx * DECODE_BATCH_SIZE + batch.len());
    }
    reporter.finish_stage();
    Ok(canvas)
}

/// Cut, encode and record the tiles of one level. Work runs in parallel;
/// records come back in plan order.
fn retile_level(
    scaled: &RgbImage,
    level: u8,
    cells: &[LevelCell],
    layout: &OutputLayout,
    config: &SessionConfig,
    codec: &dyn NameCodec,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<Vec<Tile>> {
    let tile_size = config.tile_size;
    let quality = config.pyramid.quality;
    let counter = AtomicUsize::new(0);

    reporter.begin_stage(Stage::Retiling, Some(cells.len()));
    let results: Vec<Result<Tile>> = cells
        .par_iter()
        .map(|cell| {
            let mut block =
                imageops::crop_imm(scaled, cell.x, cell.y, cell.width, cell.height).to_image();
            if block.dimensions() != (tile_size, tile_size) {
                block = imageops::resize(&block, tile_size, tile_size, FilterType::Triangle);
            }

            let key = TileKey {
                level,
                row: cell.row,
                column: cell.column,
                index: cell.index + ((level as u64) << LEVEL_INDEX_SHIFT),
            };
            let image_name = codec.encode(&key)?;
            save_jpeg(&block, &layout.tile_path(level, &image_name), quality)?;

            let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.advance(done);
            Ok(Tile::new(
                key,
                cell.x as i64,
                cell.y as i64,
                tile_size,
                tile_size,
                image_name,
            ))
        })
        .collect();
    reporter.finish_stage();

    results.into_iter().collect()
}
