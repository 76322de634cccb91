/// Number of pyramid levels, 0 (finest) through 7 (coarsest).
pub const LEVEL_COUNT: u8 = 8;

/// Coarsest pyramid level.
pub const MAX_LEVEL: u8 = LEVEL_COUNT - 1;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 1024;

/// Default fraction of a tile shared with its neighbour (10%).
pub const DEFAULT_OVERLAP_FRACTION: f64 = 0.1;

/// Background channel value written into every tile record and used to
/// fill empty canvas regions.
pub const BACKGROUND_LEVEL: u8 = 240;

/// JPEG quality for captured level-0 tiles.
pub const CAPTURE_JPEG_QUALITY: u8 = 95;

/// JPEG quality for generated pyramid tiles.
pub const PYRAMID_JPEG_QUALITY: u8 = 90;

/// JPEG quality for reconstructed mosaics.
pub const MOSAIC_JPEG_QUALITY: u8 = 95;

/// Bit offset used to fold the level into generated tile indices.
pub const LEVEL_INDEX_SHIFT: u32 = 24;

/// Mask for the per-level part of a tile index (6 hex digits).
pub const INDEX_MASK: u64 = 0xFF_FFFF;

/// Minimum keypoints (and matches) required for a displacement estimate.
pub const DEFAULT_MIN_KEYPOINTS: usize = 10;

/// Maximum keypoints retained per frame by the feature detector.
pub const DEFAULT_MAX_KEYPOINTS: usize = 1000;

/// Number of best-ranked matches fed into the median.
pub const DEFAULT_BEST_MATCHES: usize = 50;

/// FAST segment-test intensity threshold.
pub const DEFAULT_FAST_THRESHOLD: u8 = 20;

/// BRIEF descriptor length in 64-bit words (256 bits).
pub const BRIEF_WORDS: usize = 4;

/// Gaussian sigma applied before BRIEF intensity tests.
pub const BRIEF_SMOOTHING_SIGMA: f32 = 2.0;

/// Side length of the square patch sampled by BRIEF.
pub const BRIEF_PATCH_SIZE: i32 = 31;

/// Canvas size (MB) above which reconstruction warns.
pub const DEFAULT_SOFT_CEILING_MB: f64 = 8000.0;

/// Canvas size (MB) above which reconstruction refuses to allocate.
pub const DEFAULT_HARD_CEILING_MB: f64 = 15000.0;

/// Largest edge written into a single mosaic file; bigger canvases are split.
pub const DEFAULT_MAX_DIMENSION: u32 = 60_000;

/// Success rate below which a reconstruction is reported as partial.
pub const DEFAULT_MIN_SUCCESS_RATE: f64 = 0.9;

/// Number of tiles decoded in parallel before being pasted in order.
pub const DECODE_BATCH_SIZE: usize = 16;

/// Bytes per canvas pixel (8-bit RGB).
pub const BYTES_PER_PIXEL: u64 = 3;

/// Bytes per megabyte as used in memory reports.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
