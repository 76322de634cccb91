use image::RgbImage;
use rayon::prelude::*;

use crate::error::Result;
use crate::reconstruct::canvas::allocate_canvas;
use crate::tile::default_background_pixel;

/// Source indices and weights contributing to one destination pixel.
type Taps = Vec<(usize, f32)>;

/// Area-averaging resize: every destination pixel is the mean of the source
/// area it covers, with partial pixels weighted by coverage.
///
/// Intended for shrinking; works separably, one output row at a time, so no
/// full-size intermediate is allocated.
pub fn downscale_area(src: &RgbImage, dst_w: u32, dst_h: u32) -> Result<RgbImage> {
    let (src_w, src_h) = src.dimensions();
    if (src_w, src_h) == (dst_w, dst_h) {
        return Ok(src.clone());
    }
    let mut dst = allocate_canvas(dst_w, dst_h, default_background_pixel())?;
    if dst_w == 0 || dst_h == 0 || src_w == 0 || src_h == 0 {
        return Ok(dst);
    }

    let x_taps = area_taps(src_w as usize, dst_w as usize);
    let y_taps = area_taps(src_h as usize, dst_h as usize);
    let src_stride = src_w as usize * 3;
    let dst_stride = dst_w as usize * 3;
    let src_raw: &[u8] = src.as_raw();
    let dst_raw: &mut [u8] = &mut dst;

    dst_raw
        .par_chunks_mut(dst_stride)
        .zip(y_taps.par_iter())
        .for_each(|(out_row, row_taps)| {
            let mut acc = vec![0.0f32; dst_stride];
            for &(sy, wy) in row_taps {
                let line = &src_raw[sy * src_stride..(sy + 1) * src_stride];
                for (dx, col_taps) in x_taps.iter().enumerate() {
                    let mut px = [0.0f32; 3];
                    for &(sx, wx) in col_taps {
                        let s = sx * 3;
                        px[0] += line[s] as f32 * wx;
                        px[1] += line[s + 1] as f32 * wx;
                        px[2] += line[s + 2] as f32 * wx;
                    }
                    let d = dx * 3;
                    acc[d] += px[0] * wy;
                    acc[d + 1] += px[1] * wy;
                    acc[d + 2] += px[2] * wy;
                }
            }
            for (o, a) in out_row.iter_mut().zip(&acc) {
                *o = a.round().clamp(0.0, 255.0) as u8;
            }
        });

    Ok(dst)
}

/// Coverage weights for mapping `src_len` samples onto `dst_len` samples.
/// The weights of every destination sample sum to 1.
fn area_taps(src_len: usize, dst_len: usize) -> Vec<Taps> {
    let factor = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * factor;
            let end = ((i + 1) as f64 * factor).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|j| {
                    let overlap = end.min((j + 1) as f64) - start.max(j as f64);
                    (overlap > 0.0).then(|| (j, (overlap / (end - start)) as f32))
                })
                .collect()
        })
        .collect()
}
