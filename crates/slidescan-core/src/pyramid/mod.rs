pub mod generate;
pub mod resize;

pub use generate::{generate_levels, plan_level, LevelCell};
pub use resize::downscale_area;
