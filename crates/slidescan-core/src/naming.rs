//! Tile file-name codecs.
//!
//! Two on-disk conventions exist for the same entity: `B{level}{index:06X}C.jpg`
//! and `B{level}{row:03X}{col:03X}C.jpg`. Both have a 7-digit hex body, so a
//! name can only be read back with the codec that wrote it. The in-memory
//! [`TileKey`] carries every field; a codec only decides which subset survives
//! in the file name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::INDEX_MASK;
use crate::error::{Result, SlideScanError};
use crate::tile::TileKey;

const GRID_DIGIT_MAX: i64 = 0xFFF;
const NAME_BODY_LEN: usize = 7;

/// Fields recovered from a tile file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameFields {
    pub level: u8,
    pub row: Option<i64>,
    pub column: Option<i64>,
    pub index: Option<u64>,
}

/// Encodes a tile key into a file name and decodes names back into fields.
pub trait NameCodec: Send + Sync {
    fn encode(&self, key: &TileKey) -> Result<String>;

    /// Returns `None` when `file_name` does not follow this codec.
    fn decode(&self, file_name: &str) -> Option<NameFields>;
}

/// `B{level:X}{index:06X}C.jpg` (index masked to 24 bits).
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexCodec;

/// `B{level:X}{row:03X}{col:03X}C.jpg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridCodec;

impl NameCodec for IndexCodec {
    fn encode(&self, key: &TileKey) -> Result<String> {
        Ok(format!("B{:X}{:06X}C.jpg", key.level, key.index & INDEX_MASK))
    }

    fn decode(&self, file_name: &str) -> Option<NameFields> {
        let (level, body) = split_name(file_name)?;
        let index = u64::from_str_radix(body, 16).ok()?;
        Some(NameFields {
            level,
            row: None,
            column: None,
            index: Some(index),
        })
    }
}

impl NameCodec for GridCodec {
    fn encode(&self, key: &TileKey) -> Result<String> {
        for value in [key.row, key.column] {
            if !(0..=GRID_DIGIT_MAX).contains(&value) {
                return Err(SlideScanError::NameOutOfRange { value, digits: 3 });
            }
        }
        Ok(format!("B{:X}{:03X}{:03X}C.jpg", key.level, key.row, key.column))
    }

    fn decode(&self, file_name: &str) -> Option<NameFields> {
        let (level, body) = split_name(file_name)?;
        let row = i64::from_str_radix(&body[..3], 16).ok()?;
        let column = i64::from_str_radix(&body[3..], 16).ok()?;
        Some(NameFields {
            level,
            row: Some(row),
            column: Some(column),
            index: None,
        })
    }
}

/// Split `B<level><body>C.JPG` into its level digit and 6-digit body.
fn split_name(file_name: &str) -> Option<(u8, &str)> {
    let split = file_name.len().checked_sub(5)?;
    if !file_name.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = file_name.split_at(split);
    if !ext.eq_ignore_ascii_case("C.jpg") {
        return None;
    }
    let rest = stem.strip_prefix('B').or_else(|| stem.strip_prefix('b'))?;
    if rest.len() != NAME_BODY_LEN || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let level = u8::from_str_radix(&rest[..1], 16).ok()?;
    Some((level, &rest[1..]))
}

/// Which codec names files on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingScheme {
    #[default]
    Index,
    Grid,
}

impl NamingScheme {
    pub fn codec(self) -> &'static dyn NameCodec {
        match self {
            Self::Index => &IndexCodec,
            Self::Grid => &GridCodec,
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => write!(f, "Index (B{{level}}{{index:06X}}C)"),
            Self::Grid => write!(f, "Grid (B{{level}}{{row:03X}}{{col:03X}}C)"),
        }
    }
}
