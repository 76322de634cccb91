use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::LEVEL_COUNT;
use crate::error::Result;

const BLOCKS_DIR: &str = "Blocks";
const DATA_DIR: &str = "Data";
const CATALOG_FILE: &str = "BlocksJson.json";

/// Directory layout of a scan output root:
///
/// ```text
/// <root>/Blocks/L00 .. L07/   tile images per level
/// <root>/Data/BlocksJson.json catalog
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.root.join(BLOCKS_DIR)
    }

    pub fn level_dir(&self, level: u8) -> PathBuf {
        self.blocks_dir().join(level_dir_name(level))
    }

    pub fn tile_path(&self, level: u8, image_name: &str) -> PathBuf {
        self.level_dir(level).join(image_name)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir().join(CATALOG_FILE)
    }

    /// Create the root, every level directory and the metadata directory.
    pub fn create_dirs(&self) -> Result<()> {
        for level in 0..LEVEL_COUNT {
            fs::create_dir_all(self.level_dir(level))?;
        }
        fs::create_dir_all(self.data_dir())?;
        Ok(())
    }
}

/// `L00` .. `L07`.
pub fn level_dir_name(level: u8) -> String {
    format!("L0{level}")
}
