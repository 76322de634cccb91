//! Displacement by FFT phase correlation of consecutive grayscale frames.

use std::f64::consts::TAU;
use std::sync::Arc;

use image::{imageops, GrayImage, RgbImage};
use ndarray::{Array1, Array2, Axis, Zip};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::estimator::{Displacement, DisplacementEstimator, Estimate, UnmatchedReason};

type Spectrum = Array2<Complex<f64>>;

/// Estimator that correlates whole frames instead of matching keypoints.
///
/// Every pair of equally sized frames yields a displacement; it is bounded by
/// half the frame size on each axis because of FFT wrap-around. Each frame is
/// transformed once and its spectrum kept as the next reference.
#[derive(Default)]
pub struct PhaseCorrelationEstimator {
    transform: Option<Transform2d>,
    reference: Option<Spectrum>,
}

impl PhaseCorrelationEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplacementEstimator for PhaseCorrelationEstimator {
    fn estimate(&mut self, frame: &RgbImage) -> Estimate {
        let current = gray_to_array(&imageops::grayscale(frame));
        let dim = current.dim();

        let resized = !matches!(&self.transform, Some(t) if t.dim() == dim);
        if resized {
            self.transform = Some(Transform2d::new(dim.0, dim.1));
        }
        let Some(transform) = self.transform.as_ref() else {
            return Estimate::Unmatched(UnmatchedReason::Baseline);
        };

        let spectrum = transform.forward(&current);
        let estimate = match self.reference.as_ref() {
            Some(previous) if !resized => {
                let (dx, dy) = transform.offset(previous, &spectrum);
                Estimate::Matched(Displacement::new(dx, dy))
            }
            Some(_) => Estimate::Unmatched(UnmatchedReason::DimensionMismatch),
            None => Estimate::Unmatched(UnmatchedReason::Baseline),
        };
        self.reference = Some(spectrum);
        estimate
    }

    fn reset(&mut self) {
        self.reference = None;
    }
}

fn gray_to_array(gray: &GrayImage) -> Array2<f32> {
    let (w, h) = gray.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32)[0] as f32 / 255.0
    })
}

/// Translation `(dx, dy)` that maps `target` back onto `reference`, i.e. the
/// view motion when `target` follows `reference`.
pub fn compute_offset_array(reference: &Array2<f32>, target: &Array2<f32>) -> (f64, f64) {
    let (rows, cols) = reference.dim();
    let transform = Transform2d::new(rows, cols);
    transform.offset(&transform.forward(reference), &transform.forward(target))
}

/// FFT plans and Hann window for one frame size.
struct Transform2d {
    forward_rows: Arc<dyn Fft<f64>>,
    forward_cols: Arc<dyn Fft<f64>>,
    inverse_rows: Arc<dyn Fft<f64>>,
    inverse_cols: Arc<dyn Fft<f64>>,
    window: Array2<f64>,
}

impl Transform2d {
    fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::new();
        let wy = hann(rows);
        let wx = hann(cols);
        Self {
            forward_rows: planner.plan_fft_forward(cols),
            forward_cols: planner.plan_fft_forward(rows),
            inverse_rows: planner.plan_fft_inverse(cols),
            inverse_cols: planner.plan_fft_inverse(rows),
            window: Array2::from_shape_fn((rows, cols), |(r, c)| wy[r] * wx[c]),
        }
    }

    fn dim(&self) -> (usize, usize) {
        self.window.dim()
    }

    /// Windowed 2-D spectrum of `data`.
    fn forward(&self, data: &Array2<f32>) -> Spectrum {
        let mut spectrum = Spectrum::zeros(data.raw_dim());
        Zip::from(&mut spectrum)
            .and(data)
            .and(&self.window)
            .for_each(|s, &v, &w| *s = Complex::new(v as f64 * w, 0.0));
        transform_lanes(&mut spectrum, Axis(1), self.forward_rows.as_ref());
        transform_lanes(&mut spectrum, Axis(0), self.forward_cols.as_ref());
        spectrum
    }

    fn offset(&self, reference: &Spectrum, target: &Spectrum) -> (f64, f64) {
        let mut cross = Spectrum::zeros(reference.raw_dim());
        Zip::from(&mut cross)
            .and(reference)
            .and(target)
            .for_each(|c, &r, &t| {
                let product = r * t.conj();
                let magnitude = product.norm();
                *c = if magnitude > 1e-12 {
                    product / magnitude
                } else {
                    Complex::default()
                };
            });

        // Unnormalized inverse; only the location and shape of the peak matter
        transform_lanes(&mut cross, Axis(0), self.inverse_cols.as_ref());
        transform_lanes(&mut cross, Axis(1), self.inverse_rows.as_ref());
        let surface = cross.mapv(|c| c.re);

        let (peak_row, peak_col) = surface
            .indexed_iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap_or((0, 0));
        let (rows, cols) = surface.dim();
        let (sub_row, sub_col) = refine_peak(&surface, peak_row, peak_col);

        (
            wrap_signed(peak_col, cols) + sub_col,
            wrap_signed(peak_row, rows) + sub_row,
        )
    }
}

/// Run `fft` over every lane of `data` along `axis`, in place.
fn transform_lanes(data: &mut Spectrum, axis: Axis, fft: &dyn Fft<f64>) {
    let mut buf = Vec::with_capacity(data.len_of(axis));
    for mut lane in data.lanes_mut(axis) {
        buf.clear();
        buf.extend(lane.iter().copied());
        fft.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(&buf) {
            *dst = *src;
        }
    }
}

fn hann(len: usize) -> Array1<f64> {
    Array1::from_shape_fn(len, |i| 0.5 - 0.5 * (TAU * i as f64 / len as f64).cos())
}

/// Peak index past the midpoint wraps to a negative shift.
fn wrap_signed(index: usize, len: usize) -> f64 {
    if index > len / 2 {
        index as f64 - len as f64
    } else {
        index as f64
    }
}

/// Sub-pixel peak offset `(row, col)` from a parabola through the peak and
/// its direct neighbours on each axis. Neighbours wrap like the correlation
/// surface itself.
fn refine_peak(surface: &Array2<f64>, row: usize, col: usize) -> (f64, f64) {
    let (rows, cols) = surface.dim();
    if rows < 3 || cols < 3 {
        return (0.0, 0.0);
    }
    let peak = surface[[row, col]];
    let up = surface[[(row + rows - 1) % rows, col]];
    let down = surface[[(row + 1) % rows, col]];
    let left = surface[[row, (col + cols - 1) % cols]];
    let right = surface[[row, (col + 1) % cols]];
    (parabola_vertex(up, peak, down), parabola_vertex(left, peak, right))
}

fn parabola_vertex(before: f64, peak: f64, after: f64) -> f64 {
    let curvature = before - 2.0 * peak + after;
    if curvature.abs() < 1e-12 {
        0.0
    } else {
        (0.5 * (before - after) / curvature).clamp(-0.5, 0.5)
    }
}
