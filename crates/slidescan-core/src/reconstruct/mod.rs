pub mod canvas;
pub mod grid;
pub mod metadata;
pub mod types;

pub use grid::{reconstruct_grid, GridTileSet};
pub use metadata::reconstruct_level;
pub use types::{CancelToken, ReconstructOutcome};
