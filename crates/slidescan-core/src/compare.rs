//! Similarity between a stitched mosaic and a reference image.

use std::fmt;

use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;

/// Score in percent (100 = identical) and the per-pixel absolute difference.
#[derive(Clone, Debug)]
pub struct Similarity {
    pub score: f64,
    pub diff: RgbImage,
}

impl Similarity {
    pub fn rating(&self) -> Rating {
        Rating::from_score(self.score)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score > 95.0 {
            Self::Excellent
        } else if score > 85.0 {
            Self::Good
        } else if score > 70.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::Fair => write!(f, "Fair"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}

pub trait ImageComparator {
    /// Compare `candidate` against `reference`.
    fn compare(&self, reference: &RgbImage, candidate: &RgbImage) -> Similarity;
}

/// Resizes the candidate to the reference size and scores
/// `100 * (1 - mean(|a - b|) / 255)` over all channels.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanAbsoluteComparator;

impl ImageComparator for MeanAbsoluteComparator {
    fn compare(&self, reference: &RgbImage, candidate: &RgbImage) -> Similarity {
        let (w, h) = reference.dimensions();
        let resized;
        let candidate = if candidate.dimensions() == (w, h) {
            candidate
        } else {
            resized = imageops::resize(candidate, w, h, FilterType::Triangle);
            &resized
        };

        let mut diff = RgbImage::new(w, h);
        let diff_raw: &mut [u8] = &mut diff;
        diff_raw
            .par_iter_mut()
            .zip(reference.as_raw().par_iter())
            .zip(candidate.as_raw().par_iter())
            .for_each(|((d, &a), &b)| *d = a.abs_diff(b));

        let samples = diff_raw.len();
        let score = if samples == 0 {
            0.0
        } else {
            let total: u64 = diff_raw.par_iter().map(|&v| v as u64).sum();
            let mean = total as f64 / samples as f64;
            100.0 * (1.0 - mean / 255.0)
        };

        Similarity { score, diff }
    }
}
