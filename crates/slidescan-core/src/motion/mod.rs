//! Frame-to-frame displacement estimation.

pub mod estimator;
pub mod features;
pub mod matcher;
pub mod phase_correlation;

pub use estimator::{
    build_estimator, Displacement, DisplacementEstimator, Estimate, FeatureEstimator,
    UnmatchedReason,
};
pub use phase_correlation::PhaseCorrelationEstimator;
