use slidescan_core::acquire::{CaptureController, CaptureEvent, ControllerState};
use slidescan_core::config::PositionPolicy;
use slidescan_core::motion::{Displacement, Estimate, UnmatchedReason};

fn matched(dx: f64, dy: f64) -> Estimate {
    Estimate::Matched(Displacement::new(dx, dy))
}

fn scanning(step: u32) -> CaptureController {
    let mut c = CaptureController::new(step, PositionPolicy::Truncate);
    c.start();
    c
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[test]
fn test_starts_idle_and_ignores_motion() {
    let mut c = CaptureController::new(100, PositionPolicy::Truncate);
    assert_eq!(c.state(), ControllerState::Idle);
    assert!(c.on_estimate(&matched(500.0, 0.0)).is_none());
    assert_eq!(c.accumulated(), (0.0, 0.0));
}

#[test]
fn test_start_pause_resume() {
    let mut c = scanning(100);
    assert_eq!(c.state(), ControllerState::Scanning);
    c.on_estimate(&matched(30.0, 0.0));

    c.pause();
    assert_eq!(c.state(), ControllerState::Paused);
    assert!(c.on_estimate(&matched(90.0, 0.0)).is_none());
    assert_eq!(c.accumulated(), (30.0, 0.0));

    c.start();
    assert_eq!(c.state(), ControllerState::Scanning);
    let event = c.on_estimate(&matched(70.0, 0.0));
    assert_eq!(event, Some(CaptureEvent { x: 100, y: 0 }));
}

#[test]
fn test_pause_when_idle_is_noop() {
    let mut c = CaptureController::new(100, PositionPolicy::Truncate);
    c.pause();
    assert_eq!(c.state(), ControllerState::Idle);
}

#[test]
fn test_reset_clears_position_and_accumulator() {
    let mut c = scanning(50);
    c.on_estimate(&matched(60.0, 0.0));
    c.on_estimate(&matched(10.0, 5.0));
    c.reset();
    assert_eq!(c.state(), ControllerState::Idle);
    assert_eq!(c.position(), (0, 0));
    assert_eq!(c.accumulated(), (0.0, 0.0));
}

// ---------------------------------------------------------------------------
// Capture threshold
// ---------------------------------------------------------------------------

#[test]
fn test_capture_fires_when_norm_reaches_step() {
    let mut c = scanning(100);
    assert!(c.on_estimate(&matched(60.0, 0.0)).is_none());
    let event = c.on_estimate(&matched(40.0, 0.0));
    assert_eq!(event, Some(CaptureEvent { x: 100, y: 0 }));
    assert_eq!(c.accumulated(), (0.0, 0.0));
}

#[test]
fn test_diagonal_motion_uses_euclidean_norm() {
    let mut c = scanning(100);
    // 84.9 px along the diagonal, below the step on the norm
    assert!(c.on_estimate(&matched(60.0, 60.0)).is_none());
    assert!(c.on_estimate(&matched(10.0, 10.0)).is_none());
    let event = c.on_estimate(&matched(1.0, 1.0)).unwrap();
    assert_eq!(event, CaptureEvent { x: 71, y: 71 });
}

#[test]
fn test_unmatched_frame_leaves_accumulator() {
    let mut c = scanning(100);
    c.on_estimate(&matched(25.5, -3.0));
    let unmatched = Estimate::Unmatched(UnmatchedReason::TooFewKeypoints {
        previous: 3,
        current: 200,
    });
    assert!(c.on_estimate(&unmatched).is_none());
    assert_eq!(c.accumulated(), (25.5, -3.0));
}

#[test]
fn test_capture_iff_norm_reaches_step_over_sequence() {
    let step = 37.0;
    let mut c = scanning(37);
    let mut state = 0x1234_5678u64;
    let mut rand = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as f64 / (1u64 << 31) as f64) * 20.0 - 10.0
    };

    let (mut ax, mut ay) = (0.0f64, 0.0f64);
    for _ in 0..2000 {
        let (dx, dy) = (rand(), rand());
        ax += dx;
        ay += dy;
        let expect = ax.hypot(ay) >= step;
        let event = c.on_estimate(&matched(dx, dy));
        assert_eq!(event.is_some(), expect);
        if expect {
            ax = 0.0;
            ay = 0.0;
            assert_eq!(c.accumulated(), (0.0, 0.0));
        }
    }
}

// ---------------------------------------------------------------------------
// Position policy
// ---------------------------------------------------------------------------

#[test]
fn test_truncation_drops_fraction() {
    let mut c = scanning(100);
    let event = c.on_estimate(&matched(100.9, 0.7)).unwrap();
    assert_eq!(event, CaptureEvent { x: 100, y: 0 });
}

#[test]
fn test_truncation_toward_zero_for_negative_motion() {
    let mut c = scanning(100);
    let event = c.on_estimate(&matched(-100.5, -0.9)).unwrap();
    assert_eq!(event, CaptureEvent { x: -100, y: 0 });
}

#[test]
fn test_round_policy() {
    let mut c = CaptureController::new(100, PositionPolicy::Round);
    c.start();
    let event = c.on_estimate(&matched(100.9, 0.7)).unwrap();
    assert_eq!(event, CaptureEvent { x: 101, y: 1 });
}

#[test]
fn test_positions_accumulate_across_captures() {
    let mut c = scanning(100);
    c.on_estimate(&matched(100.0, 0.0));
    c.on_estimate(&matched(0.0, 120.0));
    let event = c.on_estimate(&matched(-100.0, 0.0)).unwrap();
    assert_eq!(event, CaptureEvent { x: 0, y: 120 });
    assert_eq!(c.position(), (0, 120));
}

// ---------------------------------------------------------------------------
// Forced capture
// ---------------------------------------------------------------------------

#[test]
fn test_force_capture_below_threshold() {
    let mut c = scanning(100);
    c.on_estimate(&matched(30.7, -5.2));
    let event = c.force_capture();
    assert_eq!(event, CaptureEvent { x: 30, y: -5 });
    assert_eq!(c.accumulated(), (0.0, 0.0));
}
