use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::io::image_io::save_jpeg;
use crate::io::layout::OutputLayout;
use crate::naming::NameCodec;
use crate::tile::{Tile, TileKey};

/// Grid cell `(row, column)` of an absolute position: `floor(v / step)`.
pub fn grid_cell(x: i64, y: i64, step_size: u32) -> (i64, i64) {
    let step = step_size.max(1) as i64;
    (y.div_euclid(step), x.div_euclid(step))
}

/// Turns capture events into level-0 tile files and catalog records.
pub struct GridIndex {
    layout: OutputLayout,
    tile_size: u32,
    step_size: u32,
    quality: u8,
    codec: &'static dyn NameCodec,
    next_index: u64,
    catalog: Catalog,
}

impl GridIndex {
    pub fn new(
        layout: OutputLayout,
        tile_size: u32,
        step_size: u32,
        quality: u8,
        codec: &'static dyn NameCodec,
    ) -> Self {
        Self {
            layout,
            tile_size,
            step_size,
            quality,
            codec,
            next_index: 0,
            catalog: Catalog::new(),
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    /// Number of tiles captured so far (orphaned revisits included).
    pub fn captured(&self) -> u64 {
        self.next_index
    }

    /// Forget every record and restart the index counter. Files stay on disk.
    pub fn clear(&mut self) {
        self.catalog.clear();
        self.next_index = 0;
    }

    /// Crop the frame centre, write it as the next level-0 tile placed at
    /// `(x, y)` and record it in the catalog.
    pub fn on_capture(&mut self, frame: &RgbImage, x: i64, y: i64) -> Result<Tile> {
        let tile_image = crop_center(frame, self.tile_size);
        let (row, column) = grid_cell(x, y, self.step_size);

        let key = TileKey {
            level: 0,
            row,
            column,
            index: self.next_index,
        };
        let image_name = self.codec.encode(&key)?;
        save_jpeg(
            &tile_image,
            &self.layout.tile_path(0, &image_name),
            self.quality,
        )?;
        self.next_index += 1;

        let tile = Tile::new(key, x, y, self.tile_size, self.tile_size, image_name);
        info!(
            index = key.index,
            row,
            col = column,
            x,
            y,
            name = %tile.image_name,
            "Captured tile"
        );
        self.catalog.insert(tile.clone());
        Ok(tile)
    }
}

/// `tile_size` square centred on the frame, clamped to the frame and resized
/// to the exact tile size when the frame is too small.
pub fn crop_center(frame: &RgbImage, tile_size: u32) -> RgbImage {
    let (w, h) = frame.dimensions();
    let half = tile_size / 2;
    let (cx, cy) = (w / 2, h / 2);

    let x1 = cx.saturating_sub(half);
    let y1 = cy.saturating_sub(half);
    let x2 = (cx + half).min(w);
    let y2 = (cy + half).min(h);

    let crop = imageops::crop_imm(frame, x1, y1, x2 - x1, y2 - y1).to_image();
    if crop.dimensions() == (tile_size, tile_size) {
        crop
    } else {
        imageops::resize(&crop, tile_size, tile_size, FilterType::Triangle)
    }
}
