#![allow(dead_code)]

use std::path::Path;

use image::{Rgb, RgbImage};
use slidescan_core::config::SessionConfig;
use slidescan_core::io::image_io::save_jpeg;
use slidescan_core::io::layout::OutputLayout;
use slidescan_core::tile::{Tile, TileKey};
use tempfile::TempDir;

/// Temporary scan root with every level directory created.
pub fn temp_layout() -> (TempDir, OutputLayout) {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    layout.create_dirs().unwrap();
    (dir, layout)
}

pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Deterministic texture of random 4x4 blocks, rich in corners.
pub fn block_noise(width: u32, height: u32, seed: u64) -> RgbImage {
    let block = 4;
    let bw = width.div_ceil(block) as usize;
    let bh = height.div_ceil(block) as usize;
    let mut state = seed | 1;
    let values: Vec<u8> = (0..bw * bh)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 56) as u8
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        let v = values[(y / block) as usize * bw + (x / block) as usize];
        Rgb([v, v, v])
    })
}

/// `w x h` window of `image` with its top-left corner at `(x, y)`.
pub fn window(image: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> RgbImage {
    image::imageops::crop_imm(image, x, y, w, h).to_image()
}

/// Catalog record with matching core and image regions.
pub fn record(level: u8, index: u64, row: i64, column: i64, x: i64, y: i64, size: u32) -> Tile {
    let key = TileKey {
        level,
        row,
        column,
        index,
    };
    Tile::new(key, x, y, size, size, format!("B{level:X}{index:06X}C.jpg"))
}

/// Write `image` as the file named by `tile` in its level directory.
pub fn write_tile(layout: &OutputLayout, tile: &Tile, image: &RgbImage) {
    save_jpeg(image, &layout.tile_path(tile.level, &tile.image_name), 95).unwrap();
}

pub fn write_image(path: &Path, image: &RgbImage) {
    save_jpeg(image, path, 95).unwrap();
}

/// Small-tile session rooted at `root`.
pub fn small_config(root: &Path, tile_size: u32) -> SessionConfig {
    SessionConfig {
        output: root.to_path_buf(),
        tile_size,
        overlap_fraction: 0.0,
        ..Default::default()
    }
}

/// Channel-wise distance between two pixels, for JPEG-tolerant checks.
pub fn max_channel_diff(a: &Rgb<u8>, b: &Rgb<u8>) -> u8 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}
