use std::fmt;

use tracing::debug;

use crate::config::PositionPolicy;
use crate::motion::Estimate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Scanning,
    Paused,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Scanning => write!(f, "Scanning"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

/// Absolute stage position (level-0 pixels) at which a tile should be taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureEvent {
    pub x: i64,
    pub y: i64,
}

/// Accumulates estimated motion and decides when a tile boundary is crossed.
///
/// A capture fires once the Euclidean norm of the accumulator reaches the
/// step size. The accumulator is folded into the integer position through the
/// configured [`PositionPolicy`] and then reset to exactly zero; motion lost
/// to truncation is not carried over.
#[derive(Clone, Debug)]
pub struct CaptureController {
    state: ControllerState,
    step_size: f64,
    policy: PositionPolicy,
    acc_dx: f64,
    acc_dy: f64,
    x: i64,
    y: i64,
}

impl CaptureController {
    pub fn new(step_size: u32, policy: PositionPolicy) -> Self {
        Self {
            state: ControllerState::Idle,
            step_size: step_size as f64,
            policy,
            acc_dx: 0.0,
            acc_dy: 0.0,
            x: 0,
            y: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ControllerState::Scanning
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Current accumulator `(dx, dy)`.
    pub fn accumulated(&self) -> (f64, f64) {
        (self.acc_dx, self.acc_dy)
    }

    /// Absolute position of the last capture.
    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// `Idle`/`Paused` to `Scanning`. Position and accumulator are kept.
    pub fn start(&mut self) {
        if self.state != ControllerState::Scanning {
            debug!(from = %self.state, "Scanning started");
            self.state = ControllerState::Scanning;
        }
    }

    /// `Scanning` to `Paused`; a no-op in any other state.
    pub fn pause(&mut self) {
        if self.state == ControllerState::Scanning {
            debug!(x = self.x, y = self.y, "Scanning paused");
            self.state = ControllerState::Paused;
        }
    }

    /// Back to `Idle` at the origin with an empty accumulator.
    pub fn reset(&mut self) {
        self.state = ControllerState::Idle;
        self.acc_dx = 0.0;
        self.acc_dy = 0.0;
        self.x = 0;
        self.y = 0;
    }

    /// Feed one estimator result. Returns the capture position when the
    /// accumulated motion reaches the step size.
    ///
    /// Ignored unless scanning. Unmatched frames leave the accumulator as is.
    pub fn on_estimate(&mut self, estimate: &Estimate) -> Option<CaptureEvent> {
        if !self.is_scanning() {
            return None;
        }
        let displacement = estimate.displacement()?;

        self.acc_dx += displacement.dx;
        self.acc_dy += displacement.dy;

        if self.acc_dx.hypot(self.acc_dy) >= self.step_size {
            Some(self.commit())
        } else {
            None
        }
    }

    /// Capture at the current accumulated position regardless of the threshold.
    pub fn force_capture(&mut self) -> CaptureEvent {
        self.commit()
    }

    fn commit(&mut self) -> CaptureEvent {
        self.x += self.policy.apply(self.acc_dx);
        self.y += self.policy.apply(self.acc_dy);
        self.acc_dx = 0.0;
        self.acc_dy = 0.0;
        CaptureEvent {
            x: self.x,
            y: self.y,
        }
    }
}
