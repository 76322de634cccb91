//! Canvas allocation under memory ceilings, and tile pasting.

use image::{Rgb, RgbImage};
use rayon::prelude::*;
use tracing::warn;

use crate::config::ReconstructConfig;
use crate::consts::{BYTES_PER_MB, BYTES_PER_PIXEL};
use crate::error::{Result, SlideScanError};

/// Size of a `width x height` RGB canvas in MB.
pub fn projected_megabytes(width: u64, height: u64) -> f64 {
    (width as f64) * (height as f64) * BYTES_PER_PIXEL as f64 / BYTES_PER_MB
}

/// Apply the soft and hard ceilings to a projected canvas. Nothing is
/// allocated here. Returns the projected size in MB.
pub fn check_canvas_size(width: u64, height: u64, config: &ReconstructConfig) -> Result<f64> {
    let megabytes = projected_megabytes(width, height);

    if megabytes > config.hard_ceiling_mb || width > u32::MAX as u64 || height > u32::MAX as u64 {
        return Err(SlideScanError::CanvasTooLarge {
            width,
            height,
            megabytes,
            ceiling_mb: config.hard_ceiling_mb,
        });
    }
    if megabytes > config.soft_ceiling_mb {
        warn!(
            width,
            height,
            megabytes = %format!("{megabytes:.1}"),
            "Canvas is very large; a coarser level is recommended"
        );
    }
    Ok(megabytes)
}

/// Allocate a canvas filled with `background`. Allocation failure is
/// reported as [`SlideScanError::OutOfMemory`] instead of aborting.
pub fn allocate_canvas(width: u32, height: u32, background: Rgb<u8>) -> Result<RgbImage> {
    let megabytes = projected_megabytes(width as u64, height as u64);
    let oom = || SlideScanError::OutOfMemory { megabytes };

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL as usize))
        .ok_or_else(oom)?;

    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| oom())?;
    buf.resize(len, 0);
    buf.par_chunks_exact_mut(3)
        .for_each(|px| px.copy_from_slice(&background.0));

    RgbImage::from_raw(width, height, buf).ok_or_else(oom)
}

/// Copy `tile` onto `canvas` with its top-left corner at `(x, y)`.
///
/// Returns `false`, leaving the canvas untouched, when the tile would not fit
/// entirely inside the canvas.
pub fn paste(canvas: &mut RgbImage, tile: &RgbImage, x: i64, y: i64) -> bool {
    let (cw, ch) = canvas.dimensions();
    let (tw, th) = tile.dimensions();
    if x < 0 || y < 0 || x + tw as i64 > cw as i64 || y + th as i64 > ch as i64 {
        return false;
    }

    let (x, y) = (x as usize, y as usize);
    let canvas_stride = cw as usize * 3;
    let tile_stride = tw as usize * 3;
    let dst: &mut [u8] = &mut *canvas;
    let src: &[u8] = tile.as_raw();

    for row in 0..th as usize {
        let d = (y + row) * canvas_stride + x * 3;
        let s = row * tile_stride;
        dst[d..d + tile_stride].copy_from_slice(&src[s..s + tile_stride]);
    }
    true
}
