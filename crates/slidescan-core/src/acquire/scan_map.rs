use std::collections::HashSet;

use crate::catalog::Catalog;

/// Occupied level-0 cells and their row/column bounds.
///
/// Derived state only; [`ScanMap::from_catalog`] rebuilds it at any time.
#[derive(Clone, Debug, Default)]
pub struct ScanMap {
    cells: HashSet<(i64, i64)>,
    bounds: Option<CellBounds>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellBounds {
    pub min_row: i64,
    pub max_row: i64,
    pub min_col: i64,
    pub max_col: i64,
}

impl CellBounds {
    pub fn rows(&self) -> u64 {
        (self.max_row - self.min_row + 1) as u64
    }

    pub fn cols(&self) -> u64 {
        (self.max_col - self.min_col + 1) as u64
    }
}

impl ScanMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut map = Self::new();
        for tile in catalog.level(0) {
            map.mark(tile.row, tile.column);
        }
        map
    }

    pub fn mark(&mut self, row: i64, col: i64) {
        self.cells.insert((row, col));
        self.bounds = Some(match self.bounds {
            None => CellBounds {
                min_row: row,
                max_row: row,
                min_col: col,
                max_col: col,
            },
            Some(b) => CellBounds {
                min_row: b.min_row.min(row),
                max_row: b.max_row.max(row),
                min_col: b.min_col.min(col),
                max_col: b.max_col.max(col),
            },
        });
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        self.cells.contains(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn bounds(&self) -> Option<CellBounds> {
        self.bounds
    }

    /// Occupied fraction of the bounding rectangle (0.0 when empty).
    pub fn coverage(&self) -> f64 {
        match self.bounds {
            Some(b) => self.cells.len() as f64 / (b.rows() * b.cols()) as f64,
            None => 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.bounds = None;
    }
}
