use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbImage;

/// Result of stitching one level.
#[derive(Clone, Debug)]
pub struct ReconstructOutcome {
    pub canvas: RgbImage,
    /// Tiles pasted onto the canvas.
    pub processed: usize,
    /// Tiles considered for the level.
    pub total: usize,
    /// Tiles that were missing, unreadable or fell outside the canvas.
    pub failed: usize,
    /// On-disk tile width divided by the recorded width.
    pub scale: f64,
    /// Projected canvas size in MB.
    pub projected_mb: f64,
}

impl ReconstructOutcome {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    /// `true` when fewer than `min_success_rate` of the tiles were placed.
    pub fn is_partial(&self, min_success_rate: f64) -> bool {
        self.success_rate() < min_success_rate
    }
}

/// Cooperative cancellation flag shared between a caller and a running pass.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
