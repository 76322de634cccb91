use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CAPTURE_JPEG_QUALITY, DEFAULT_BEST_MATCHES, DEFAULT_FAST_THRESHOLD, DEFAULT_HARD_CEILING_MB,
    DEFAULT_MAX_DIMENSION, DEFAULT_MAX_KEYPOINTS, DEFAULT_MIN_KEYPOINTS, DEFAULT_MIN_SUCCESS_RATE,
    DEFAULT_OVERLAP_FRACTION, DEFAULT_SOFT_CEILING_MB, DEFAULT_TILE_SIZE, MAX_LEVEL,
    MOSAIC_JPEG_QUALITY, PYRAMID_JPEG_QUALITY,
};
use crate::error::{Result, SlideScanError};
use crate::naming::NamingScheme;

/// Everything an acquisition session and the downstream passes need.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Output root (contains `Blocks/` and `Data/`).
    pub output: PathBuf,
    /// Edge length of every tile, all levels.
    pub tile_size: u32,
    /// Fraction of a tile shared with the next capture (0.0..1.0).
    pub overlap_fraction: f64,
    /// JPEG quality of captured level-0 tiles.
    pub capture_quality: u8,
    pub naming: NamingScheme,
    pub position_policy: PositionPolicy,
    pub estimator: EstimatorConfig,
    pub pyramid: PyramidConfig,
    pub reconstruct: ReconstructConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("scan_output"),
            tile_size: DEFAULT_TILE_SIZE,
            overlap_fraction: DEFAULT_OVERLAP_FRACTION,
            capture_quality: CAPTURE_JPEG_QUALITY,
            naming: NamingScheme::default(),
            position_policy: PositionPolicy::default(),
            estimator: EstimatorConfig::default(),
            pyramid: PyramidConfig::default(),
            reconstruct: ReconstructConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Accumulated motion (px) that triggers a capture: `tile_size * (1 - overlap)`.
    pub fn step_size(&self) -> u32 {
        step_size(self.tile_size, self.overlap_fraction)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(SlideScanError::InvalidConfig("tile_size must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(SlideScanError::InvalidConfig(format!(
                "overlap_fraction {} must be in [0, 1)",
                self.overlap_fraction
            )));
        }
        if self.step_size() == 0 {
            return Err(SlideScanError::InvalidConfig(format!(
                "tile_size {} with overlap {} gives a zero step size",
                self.tile_size, self.overlap_fraction
            )));
        }
        if self.pyramid.levels > MAX_LEVEL {
            return Err(SlideScanError::InvalidConfig(format!(
                "pyramid.levels {} exceeds {MAX_LEVEL}",
                self.pyramid.levels
            )));
        }
        if self.estimator.min_keypoints < DEFAULT_MIN_KEYPOINTS {
            return Err(SlideScanError::InvalidConfig(format!(
                "estimator.min_keypoints {} is below the minimum of {DEFAULT_MIN_KEYPOINTS}",
                self.estimator.min_keypoints
            )));
        }
        if self.estimator.best_matches == 0 {
            return Err(SlideScanError::InvalidConfig(
                "estimator.best_matches must be > 0".into(),
            ));
        }
        if self.reconstruct.soft_ceiling_mb > self.reconstruct.hard_ceiling_mb {
            return Err(SlideScanError::InvalidConfig(
                "reconstruct.soft_ceiling_mb must not exceed hard_ceiling_mb".into(),
            ));
        }
        Ok(())
    }
}

/// `tile_size * (1 - overlap)`, truncated to whole pixels.
pub fn step_size(tile_size: u32, overlap_fraction: f64) -> u32 {
    (tile_size as f64 * (1.0 - overlap_fraction)) as u32
}

/// How fractional accumulated motion is folded into the integer stage position.
///
/// `Truncate` drops the fraction toward zero on every capture, which biases
/// long scans; `Round` is available where that drift matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionPolicy {
    #[default]
    Truncate,
    Round,
}

impl PositionPolicy {
    pub fn apply(self, value: f64) -> i64 {
        match self {
            Self::Truncate => value.trunc() as i64,
            Self::Round => value.round() as i64,
        }
    }
}

impl fmt::Display for PositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncate => write!(f, "Truncate"),
            Self::Round => write!(f, "Round"),
        }
    }
}

/// Displacement estimation algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EstimatorMethod {
    /// FAST keypoints, BRIEF descriptors, cross-checked Hamming matching.
    #[default]
    Features,
    /// FFT phase correlation of the grayscale frames.
    PhaseCorrelation,
}

impl fmt::Display for EstimatorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Features => write!(f, "Features (FAST + BRIEF)"),
            Self::PhaseCorrelation => write!(f, "Phase Correlation"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub method: EstimatorMethod,
    /// Keypoints kept per frame, strongest first.
    pub max_keypoints: usize,
    /// Frames with fewer keypoints, or pairs with fewer matches, are unmatched.
    pub min_keypoints: usize,
    /// Matches (lowest distance first) that enter the median.
    pub best_matches: usize,
    pub fast_threshold: u8,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            method: EstimatorMethod::default(),
            max_keypoints: DEFAULT_MAX_KEYPOINTS,
            min_keypoints: DEFAULT_MIN_KEYPOINTS,
            best_matches: DEFAULT_BEST_MATCHES,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Coarsest level to generate (1..=7).
    pub levels: u8,
    /// JPEG quality of generated tiles.
    pub quality: u8,
    /// Worker threads for re-tiling; 0 uses the global rayon pool.
    pub workers: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            levels: MAX_LEVEL,
            quality: PYRAMID_JPEG_QUALITY,
            workers: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Projected canvas size (MB) that triggers a warning.
    pub soft_ceiling_mb: f64,
    /// Projected canvas size (MB) that is refused outright.
    pub hard_ceiling_mb: f64,
    /// Largest edge of a single output file; larger mosaics are split.
    pub max_dimension: u32,
    /// Placed/total ratio below which the result is flagged as partial.
    pub min_success_rate: f64,
    /// JPEG quality of the saved mosaic.
    pub quality: u8,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            soft_ceiling_mb: DEFAULT_SOFT_CEILING_MB,
            hard_ceiling_mb: DEFAULT_HARD_CEILING_MB,
            max_dimension: DEFAULT_MAX_DIMENSION,
            min_success_rate: DEFAULT_MIN_SUCCESS_RATE,
            quality: MOSAIC_JPEG_QUALITY,
        }
    }
}
