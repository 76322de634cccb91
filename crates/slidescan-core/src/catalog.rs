use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::tile::Tile;

/// Ordered tile records for every level of one scan.
///
/// Order matters: when tiles overlap, later records are painted over earlier
/// ones during composition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tiles: Vec<Tile>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Append a record, dropping any earlier record for the same
    /// `(level, row, column)` cell. Returns the replaced record.
    ///
    /// The replaced record's image file is left on disk.
    pub fn insert(&mut self, tile: Tile) -> Option<Tile> {
        let replaced = self
            .tiles
            .iter()
            .position(|t| t.level == tile.level && t.row == tile.row && t.column == tile.column)
            .map(|pos| self.tiles.remove(pos));
        if let Some(ref old) = replaced {
            debug!(
                level = tile.level,
                row = tile.row,
                col = tile.column,
                replaced = %old.image_name,
                "Cell revisited, replacing catalog entry"
            );
        }
        self.tiles.push(tile);
        replaced
    }

    /// Records of one level, in catalog order.
    pub fn level(&self, level: u8) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(move |t| t.level == level)
    }

    /// Tile count per level present in the catalog.
    pub fn level_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for t in &self.tiles {
            *counts.entry(t.level).or_insert(0) += 1;
        }
        counts
    }

    /// Coarsest level that has at least one record.
    pub fn coarsest_level(&self) -> Option<u8> {
        self.tiles.iter().map(|t| t.level).max()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let catalog: Self = serde_json::from_reader(reader)?;
        info!(path = %path.display(), tiles = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Write the whole catalog to `path` via a sibling temp file and rename,
    /// so readers never observe a partially written file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), tiles = self.len(), "Saved catalog");
        Ok(())
    }
}
