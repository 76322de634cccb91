use std::fmt;

use image::{imageops, GrayImage, RgbImage};
use tracing::debug;

use crate::config::{EstimatorConfig, EstimatorMethod};

use super::features::{extract_features, Brief, FrameFeatures};
use super::matcher::match_cross_checked;
use super::phase_correlation::PhaseCorrelationEstimator;

/// Stage displacement between two frames, in frame pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
}

impl Displacement {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

/// Why no displacement could be estimated for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnmatchedReason {
    /// First frame after construction or reset; it becomes the reference.
    Baseline,
    TooFewKeypoints { previous: usize, current: usize },
    InsufficientMatches { found: usize, required: usize },
    DimensionMismatch,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline frame"),
            Self::TooFewKeypoints { previous, current } => {
                write!(f, "too few keypoints ({previous} previous, {current} current)")
            }
            Self::InsufficientMatches { found, required } => {
                write!(f, "insufficient matches ({found} < {required})")
            }
            Self::DimensionMismatch => write!(f, "frame size changed"),
        }
    }
}

/// Result of estimating motion for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Estimate {
    Matched(Displacement),
    Unmatched(UnmatchedReason),
}

impl Estimate {
    pub fn displacement(&self) -> Option<Displacement> {
        match self {
            Self::Matched(d) => Some(*d),
            Self::Unmatched(_) => None,
        }
    }
}

/// Sequential, stateful motion estimator: each call compares the new frame
/// against the reference kept from an earlier call.
pub trait DisplacementEstimator: Send {
    fn estimate(&mut self, frame: &RgbImage) -> Estimate;

    /// Forget the reference frame; the next call returns `Baseline`.
    fn reset(&mut self);
}

/// Build the estimator selected by `config.method`.
pub fn build_estimator(config: &EstimatorConfig) -> Box<dyn DisplacementEstimator> {
    match config.method {
        EstimatorMethod::Features => Box::new(FeatureEstimator::new(config.clone())),
        EstimatorMethod::PhaseCorrelation => Box::new(PhaseCorrelationEstimator::new()),
    }
}

/// Keypoint-matching estimator.
///
/// Matches binary descriptors between the reference and the new frame, keeps
/// the `best_matches` closest pairs and takes the median keypoint shift on
/// each axis. The returned displacement is the negated content shift.
///
/// The reference only advances on a successful match, unless the reference
/// itself is too sparse to ever match, in which case the new frame replaces it.
pub struct FeatureEstimator {
    config: EstimatorConfig,
    brief: Brief,
    reference: Option<FrameFeatures>,
}

impl FeatureEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            brief: Brief::new(),
            reference: None,
        }
    }

    fn extract(&self, gray: &GrayImage) -> FrameFeatures {
        extract_features(
            gray,
            &self.brief,
            self.config.fast_threshold,
            self.config.max_keypoints,
        )
    }
}

impl DisplacementEstimator for FeatureEstimator {
    fn estimate(&mut self, frame: &RgbImage) -> Estimate {
        let gray = imageops::grayscale(frame);
        let current = self.extract(&gray);
        let min = self.config.min_keypoints;

        let Some(reference) = self.reference.as_ref() else {
            self.reference = Some(current);
            return Estimate::Unmatched(UnmatchedReason::Baseline);
        };

        if reference.len() < min || current.len() < min {
            let reason = UnmatchedReason::TooFewKeypoints {
                previous: reference.len(),
                current: current.len(),
            };
            debug!(%reason, "Frame skipped");
            if reference.len() < min {
                self.reference = Some(current);
            }
            return Estimate::Unmatched(reason);
        }

        let matches = match_cross_checked(&reference.descriptors, &current.descriptors);
        if matches.len() < min {
            let reason = UnmatchedReason::InsufficientMatches {
                found: matches.len(),
                required: min,
            };
            debug!(%reason, "Frame skipped");
            return Estimate::Unmatched(reason);
        }

        let best = &matches[..matches.len().min(self.config.best_matches)];
        let mut dxs: Vec<f64> = Vec::with_capacity(best.len());
        let mut dys: Vec<f64> = Vec::with_capacity(best.len());
        for m in best {
            let prev = reference.keypoints[m.query_idx];
            let curr = current.keypoints[m.train_idx];
            dxs.push((curr.x - prev.x) as f64);
            dys.push((curr.y - prev.y) as f64);
        }

        let displacement = Displacement::new(-median(&mut dxs), -median(&mut dys));
        self.reference = Some(current);
        Estimate::Matched(displacement)
    }

    fn reset(&mut self) {
        self.reference = None;
    }
}

/// Median of a non-empty slice; the mean of the two middle values for even lengths.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
