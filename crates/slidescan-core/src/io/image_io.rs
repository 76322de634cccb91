use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use tracing::{info, warn};

use crate::error::{Result, SlideScanError};

/// Load any supported image file as 8-bit RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(SlideScanError::MissingTileFile(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_rgb8())
}

/// Read only the header of an image file to get its pixel dimensions.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32)> {
    if !path.exists() {
        return Err(SlideScanError::MissingTileFile(path.to_path_buf()));
    }
    Ok(image::image_dimensions(path)?)
}

/// Encode an RGB image as baseline JPEG at the given quality (1-100).
pub fn save_jpeg(img: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
    encoder.encode_image(img)?;
    Ok(())
}

/// One file written by [`save_mosaic`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MosaicPart {
    pub path: PathBuf,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Files written for one mosaic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedMosaic {
    pub parts: Vec<MosaicPart>,
}

impl SavedMosaic {
    pub fn is_split(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Save a mosaic as JPEG. A canvas with either edge above `max_dimension`
/// is written as a grid of `<stem>_part_<row>_<col>.<ext>` files, each no
/// larger than `max_dimension` on either edge.
pub fn save_mosaic(
    canvas: &RgbImage,
    path: &Path,
    max_dimension: u32,
    quality: u8,
) -> Result<SavedMosaic> {
    let (w, h) = canvas.dimensions();
    let max_dimension = max_dimension.max(1);

    if w <= max_dimension && h <= max_dimension {
        info!(path = %path.display(), width = w, height = h, "Saving mosaic");
        save_jpeg(canvas, path, quality)?;
        return Ok(SavedMosaic {
            parts: vec![MosaicPart {
                path: path.to_path_buf(),
                row: 0,
                col: 0,
                x: 0,
                y: 0,
                width: w,
                height: h,
            }],
        });
    }

    let rows = h.div_ceil(max_dimension);
    let cols = w.div_ceil(max_dimension);
    warn!(
        width = w,
        height = h,
        rows,
        cols,
        "Mosaic exceeds single-file limit, splitting into parts"
    );

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mosaic".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".to_string());
    let dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut parts = Vec::with_capacity((rows * cols) as usize);
    for r in 0..rows {
        for c in 0..cols {
            let x = c * max_dimension;
            let y = r * max_dimension;
            let pw = max_dimension.min(w - x);
            let ph = max_dimension.min(h - y);
            let part_path = dir.join(format!("{stem}_part_{r}_{c}.{ext}"));

            let part = imageops::crop_imm(canvas, x, y, pw, ph).to_image();
            info!(path = %part_path.display(), width = pw, height = ph, "Saving mosaic part");
            save_jpeg(&part, &part_path, quality)?;

            parts.push(MosaicPart {
                path: part_path,
                row: r,
                col: c,
                x,
                y,
                width: pw,
                height: ph,
            });
        }
    }

    Ok(SavedMosaic { parts })
}
