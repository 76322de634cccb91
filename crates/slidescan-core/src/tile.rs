use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::consts::BACKGROUND_LEVEL;

/// Canonical identity of a tile, independent of how its file is named on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub level: u8,
    pub row: i64,
    pub column: i64,
    pub index: u64,
}

/// One catalog record.
///
/// Field names follow the `BlocksJson.json` format consumed downstream,
/// including the `Coloumn` and `GreedBackGround` spellings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tile {
    pub index: u64,
    pub level: u8,
    #[serde(rename = "Coloumn")]
    pub column: i64,
    pub row: i64,
    pub core_x: i64,
    pub core_y: i64,
    pub core_width: u32,
    pub core_height: u32,
    pub image_x: i64,
    pub image_y: i64,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(rename = "BlueBackGround", default = "default_background")]
    pub blue_background: f64,
    #[serde(rename = "GreedBackGround", default = "default_background")]
    pub green_background: f64,
    #[serde(rename = "RedBackGround", default = "default_background")]
    pub red_background: f64,
    pub image_name: String,
}

fn default_background() -> f64 {
    BACKGROUND_LEVEL as f64
}

impl Tile {
    /// Build a record whose core and image regions coincide.
    pub fn new(key: TileKey, x: i64, y: i64, width: u32, height: u32, image_name: String) -> Self {
        Self {
            index: key.index,
            level: key.level,
            column: key.column,
            row: key.row,
            core_x: x,
            core_y: y,
            core_width: width,
            core_height: height,
            image_x: x,
            image_y: y,
            image_width: width,
            image_height: height,
            blue_background: default_background(),
            green_background: default_background(),
            red_background: default_background(),
            image_name,
        }
    }

    pub fn key(&self) -> TileKey {
        TileKey {
            level: self.level,
            row: self.row,
            column: self.column,
            index: self.index,
        }
    }

    /// Background colour carried by the record, as an RGB pixel.
    pub fn background(&self) -> Rgb<u8> {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Rgb([
            channel(self.red_background),
            channel(self.green_background),
            channel(self.blue_background),
        ])
    }

    /// Right edge (exclusive) in level coordinates.
    pub fn right(&self) -> i64 {
        self.image_x + self.image_width as i64
    }

    /// Bottom edge (exclusive) in level coordinates.
    pub fn bottom(&self) -> i64 {
        self.image_y + self.image_height as i64
    }
}

/// Axis-aligned extent of a set of tiles, in level coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl BoundingBox {
    /// Extent of the image regions of `tiles`, or `None` when empty.
    pub fn of<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> Option<Self> {
        tiles.into_iter().fold(None, |acc, t| {
            Some(match acc {
                None => Self {
                    min_x: t.image_x,
                    min_y: t.image_y,
                    max_x: t.right(),
                    max_y: t.bottom(),
                },
                Some(b) => Self {
                    min_x: b.min_x.min(t.image_x),
                    min_y: b.min_y.min(t.image_y),
                    max_x: b.max_x.max(t.right()),
                    max_y: b.max_y.max(t.bottom()),
                },
            })
        })
    }

    pub fn width(&self) -> u64 {
        (self.max_x - self.min_x).max(0) as u64
    }

    pub fn height(&self) -> u64 {
        (self.max_y - self.min_y).max(0) as u64
    }
}

/// Background pixel used for canvases that are not tied to a tile record.
pub fn default_background_pixel() -> Rgb<u8> {
    Rgb([BACKGROUND_LEVEL; 3])
}
