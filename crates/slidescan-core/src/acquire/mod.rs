pub mod controller;
pub mod grid;
pub mod scan_map;
pub mod session;

pub use controller::{CaptureController, CaptureEvent, ControllerState};
pub use grid::{grid_cell, GridIndex};
pub use scan_map::{CellBounds, ScanMap};
pub use session::{AcquisitionSession, SessionStats};
