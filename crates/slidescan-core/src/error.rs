use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Catalog format error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Level {0} out of range (0-7)")]
    InvalidLevel(u8),

    #[error("Overlap of {overlap} px must be smaller than the {tile_size} px tile")]
    InvalidOverlap { overlap: u32, tile_size: u32 },

    #[error("No tiles found for level {0}")]
    NoTilesForLevel(u8),

    #[error("Tile file not found: {}", .0.display())]
    MissingTileFile(PathBuf),

    #[error(
        "Canvas {width}x{height} needs {}, above the {} limit; use a coarser level",
        human_size(.megabytes),
        human_size(.ceiling_mb)
    )]
    CanvasTooLarge {
        width: u64,
        height: u64,
        megabytes: f64,
        ceiling_mb: f64,
    },

    #[error("Out of memory allocating a {} canvas; use a coarser level", human_size(.megabytes))]
    OutOfMemory { megabytes: f64 },

    #[error("Cannot generate levels while scanning is active; pause first")]
    ScanInProgress,

    #[error("Tile coordinate {value} cannot be encoded in a {digits}-digit hex name")]
    NameOutOfRange { value: i64, digits: usize },

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("No frames found in {}", .0.display())]
    NoFrames(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SlideScanError>;

/// Memory size in GB from 1 GB up, otherwise in MB.
fn human_size(megabytes: &f64) -> String {
    if *megabytes >= 1024.0 {
        format!("{:.1} GB", megabytes / 1024.0)
    } else if *megabytes >= 0.1 {
        format!("{megabytes:.1} MB")
    } else {
        format!("{megabytes:.4} MB")
    }
}
