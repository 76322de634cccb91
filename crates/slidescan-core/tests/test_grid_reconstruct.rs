mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::Rgb;
use slidescan_core::config::ReconstructConfig;
use slidescan_core::error::SlideScanError;
use slidescan_core::naming::{GridCodec, NameCodec};
use slidescan_core::progress::{NoOpReporter, ProgressReporter};
use slidescan_core::reconstruct::{reconstruct_grid, CancelToken, GridTileSet, ReconstructOutcome};
use slidescan_core::tile::TileKey;

use common::{max_channel_diff, solid, temp_layout, write_image};

const COLUMN_COLORS: [[u8; 3]; 3] = [[220, 30, 30], [30, 200, 40], [20, 40, 210]];
const BACKGROUND: Rgb<u8> = Rgb([240, 240, 240]);

fn grid_name(level: u8, row: i64, column: i64) -> String {
    let key = TileKey {
        level,
        row,
        column,
        index: 0,
    };
    GridCodec.encode(&key).unwrap()
}

fn write_cell(dir: &Path, level: u8, row: i64, column: i64, size: u32, color: [u8; 3]) {
    write_image(&dir.join(grid_name(level, row, column)), &solid(size, size, color));
}

/// `rows x cols` block of 40 px tiles, coloured by column.
fn write_block(dir: &Path, rows: i64, cols: i64) {
    for row in 0..rows {
        for col in 0..cols {
            write_cell(dir, 1, row, col, 40, COLUMN_COLORS[col as usize % 3]);
        }
    }
}

fn stitch(set: &GridTileSet, overlap: u32) -> ReconstructOutcome {
    let reporter: Arc<dyn ProgressReporter> = Arc::new(NoOpReporter);
    reconstruct_grid(
        set,
        overlap,
        BACKGROUND,
        &ReconstructConfig::default(),
        &reporter,
        &CancelToken::new(),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Directory scan
// ---------------------------------------------------------------------------

#[test]
fn test_scan_collects_grid_names_of_level() {
    let (_dir, layout) = temp_layout();
    let dir = layout.level_dir(1);
    write_block(&dir, 2, 3);
    write_cell(&dir, 2, 0, 0, 40, COLUMN_COLORS[0]);
    fs::write(dir.join("notes.txt"), "not a tile").unwrap();
    write_image(&dir.join("B1001001X.jpg"), &solid(40, 40, [0, 0, 0]));

    let set = GridTileSet::scan(&dir, 1, &GridCodec).unwrap();
    assert_eq!(set.level(), 1);
    assert_eq!(set.len(), 6);
    assert_eq!(set.bounds(), (0, 1, 0, 2));
}

#[test]
fn test_scan_empty_or_missing_directory() {
    let (_dir, layout) = temp_layout();
    let err = GridTileSet::scan(&layout.level_dir(4), 4, &GridCodec).unwrap_err();
    assert!(matches!(err, SlideScanError::NoTilesForLevel(4)));

    let missing = layout.root().join("nowhere");
    let err = GridTileSet::scan(&missing, 1, &GridCodec).unwrap_err();
    assert!(matches!(err, SlideScanError::NoTilesForLevel(1)));
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

#[test]
fn test_grid_without_overlap() {
    let (_dir, layout) = temp_layout();
    let dir = layout.level_dir(1);
    write_block(&dir, 2, 3);

    let set = GridTileSet::scan(&dir, 1, &GridCodec).unwrap();
    let outcome = stitch(&set, 0);
    assert_eq!(outcome.canvas.dimensions(), (120, 80));
    assert_eq!((outcome.processed, outcome.total, outcome.failed), (6, 6, 0));
    for (col, color) in COLUMN_COLORS.iter().enumerate() {
        let x = col as u32 * 40 + 20;
        assert!(max_channel_diff(outcome.canvas.get_pixel(x, 60), &Rgb(*color)) <= 8);
    }
}

#[test]
fn test_overlap_shrinks_the_step() {
    let (_dir, layout) = temp_layout();
    let dir = layout.level_dir(1);
    write_block(&dir, 2, 3);

    let set = GridTileSet::scan(&dir, 1, &GridCodec).unwrap();
    let outcome = stitch(&set, 10);
    // (3 - 1) * 30 + 40 by (2 - 1) * 30 + 40
    assert_eq!(outcome.canvas.dimensions(), (100, 70));
    let canvas = &outcome.canvas;
    assert!(max_channel_diff(canvas.get_pixel(25, 10), &Rgb(COLUMN_COLORS[0])) <= 8);
    // Column 1 starts at x = 30 and covers the shared strip
    assert!(max_channel_diff(canvas.get_pixel(35, 10), &Rgb(COLUMN_COLORS[1])) <= 8);
    assert!(max_channel_diff(canvas.get_pixel(95, 65), &Rgb(COLUMN_COLORS[2])) <= 8);
}

#[test]
fn test_grid_is_relative_to_minimum_cell() {
    let (_dir, layout) = temp_layout();
    let dir = layout.level_dir(1);
    write_cell(&dir, 1, 5, 2, 40, COLUMN_COLORS[0]);
    write_cell(&dir, 1, 6, 3, 40, COLUMN_COLORS[2]);

    let set = GridTileSet::scan(&dir, 1, &GridCodec).unwrap();
    let outcome = stitch(&set, 0);
    assert_eq!(outcome.canvas.dimensions(), (80, 80));
    assert!(max_channel_diff(outcome.canvas.get_pixel(20, 20), &Rgb(COLUMN_COLORS[0])) <= 8);
    assert!(max_channel_diff(outcome.canvas.get_pixel(60, 60), &Rgb(COLUMN_COLORS[2])) <= 8);
    assert_eq!(outcome.canvas.get_pixel(60, 20), &BACKGROUND);
}

#[test]
fn test_mismatched_tile_is_resized() {
    let (_dir, layout) = temp_layout();
    let dir = layout.level_dir(1);
    write_cell(&dir, 1, 0, 0, 40, COLUMN_COLORS[0]);
    write_cell(&dir, 1, 0, 1, 20, COLUMN_COLORS[1]);

    let set = GridTileSet::scan(&dir, 1, &GridCodec).unwrap();
    let outcome = stitch(&set, 0);
    assert_eq!(outcome.canvas.dimensions(), (80, 40));
    assert_eq!(outcome.processed, 2);
    assert!(max_channel_diff(outcome.canvas.get_pixel(75, 35), &Rgb(COLUMN_COLORS[1])) <= 8);
}

#[test]
fn test_overlap_must_be_smaller_than_tile() {
    let (_dir, layout) = temp_layout();
    let dir = layout.level_dir(1);
    write_block(&dir, 1, 2);

    let set = GridTileSet::scan(&dir, 1, &GridCodec).unwrap();
    let reporter: Arc<dyn ProgressReporter> = Arc::new(NoOpReporter);
    let err = reconstruct_grid(
        &set,
        40,
        BACKGROUND,
        &ReconstructConfig::default(),
        &reporter,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SlideScanError::InvalidOverlap {
            overlap: 40,
            tile_size: 40
        }
    ));
}
