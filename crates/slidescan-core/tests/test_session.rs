mod common;

use std::sync::Arc;

use image::RgbImage;
use slidescan_core::acquire::{AcquisitionSession, ControllerState};
use slidescan_core::catalog::Catalog;
use slidescan_core::error::SlideScanError;
use slidescan_core::io::source::VecSource;
use slidescan_core::progress::{NoOpReporter, ProgressReporter};

use common::{block_noise, small_config, solid, window};

fn reporter() -> Arc<dyn ProgressReporter> {
    Arc::new(NoOpReporter)
}

/// Frames of a fixed texture, viewed through a window moving right by
/// `offsets[i]` pixels.
fn moving_frames(offsets: &[u32]) -> Vec<RgbImage> {
    let world = block_noise(560, 400, 0xABCDEF);
    offsets
        .iter()
        .map(|&ox| window(&world, 100 + ox, 100, 200, 200))
        .collect()
}

fn open_session(dir: &tempfile::TempDir) -> AcquisitionSession {
    let mut config = small_config(dir.path(), 64);
    config.pyramid.levels = 2;
    AcquisitionSession::open(config).unwrap()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_open_creates_layout() {
    let dir = tempfile::TempDir::new().unwrap();
    let session = open_session(&dir);
    assert_eq!(session.state(), ControllerState::Idle);
    assert!(session.layout().level_dir(0).is_dir());
    assert!(session.layout().level_dir(7).is_dir());
    assert!(session.layout().data_dir().is_dir());
}

#[test]
fn test_open_rejects_invalid_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = small_config(dir.path(), 64);
    config.overlap_fraction = 1.0;
    assert!(matches!(
        AcquisitionSession::open(config),
        Err(SlideScanError::InvalidConfig(_))
    ));
}

#[test]
fn test_frames_ignored_until_started() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    for frame in moving_frames(&[0, 64, 128]) {
        assert!(session.process_frame(&frame).unwrap().is_none());
    }
    assert_eq!(session.stats().frames_seen, 0);
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

#[test]
fn test_run_captures_every_step() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    let offsets: Vec<u32> = (0..13).map(|i| i * 16).collect();
    let mut source = VecSource::new(moving_frames(&offsets));

    session.start();
    let stats = session.run(&mut source, &reporter()).unwrap();

    assert_eq!(stats.frames_seen, 13);
    assert_eq!(stats.frames_skipped, 1);
    assert_eq!(stats.tiles_captured, 3);
    assert_eq!(stats.position, (192, 0));

    let xs: Vec<i64> = session.catalog().tiles().iter().map(|t| t.image_x).collect();
    assert_eq!(xs, vec![64, 128, 192]);
    assert_eq!(session.scan_map().len(), 3);
}

#[test]
fn test_unmatched_frame_does_not_lose_motion() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    let mut frames = moving_frames(&[0, 16, 48, 64]);
    frames.insert(2, solid(200, 200, [120, 120, 120]));
    let mut source = VecSource::new(frames);

    session.start();
    let stats = session.run(&mut source, &reporter()).unwrap();

    assert_eq!(stats.frames_skipped, 2);
    assert_eq!(stats.tiles_captured, 1);
    assert_eq!(stats.position, (64, 0));
}

#[test]
fn test_force_capture_at_current_position() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    let frames = moving_frames(&[0, 16]);

    session.start();
    for frame in &frames {
        session.process_frame(frame).unwrap();
    }
    let tile = session.force_capture(&frames[1]).unwrap();
    assert_eq!((tile.image_x, tile.image_y), (16, 0));
    assert_eq!(session.controller().accumulated(), (0.0, 0.0));
}

#[test]
fn test_reset_forgets_scan() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    let offsets: Vec<u32> = (0..5).map(|i| i * 16).collect();
    let mut source = VecSource::new(moving_frames(&offsets));
    session.start();
    session.run(&mut source, &reporter()).unwrap();
    assert_eq!(session.catalog().len(), 1);

    session.reset();
    assert_eq!(session.state(), ControllerState::Idle);
    assert!(session.catalog().is_empty());
    assert!(session.scan_map().is_empty());
    assert_eq!(session.stats().frames_seen, 0);
    assert_eq!(session.stats().position, (0, 0));
}

// ---------------------------------------------------------------------------
// Pyramid and persistence
// ---------------------------------------------------------------------------

#[test]
fn test_generate_levels_refused_while_scanning() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    session.start();
    assert!(matches!(
        session.generate_levels(&reporter()),
        Err(SlideScanError::ScanInProgress)
    ));
}

#[test]
fn test_generate_levels_after_pause() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    let offsets: Vec<u32> = (0..13).map(|i| i * 16).collect();
    let mut source = VecSource::new(moving_frames(&offsets));
    session.start();
    session.run(&mut source, &reporter()).unwrap();
    session.pause();

    let catalog = session.generate_levels(&reporter()).unwrap();
    let counts = catalog.level_counts();
    assert_eq!(counts.get(&0), Some(&3));
    assert_eq!(counts.get(&1), Some(&2));
    assert_eq!(counts.get(&2), None);

    let on_disk = Catalog::load(&session.layout().catalog_path()).unwrap();
    assert_eq!(on_disk.len(), 5);
}

#[test]
fn test_failed_generation_keeps_level_zero_catalog() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = small_config(dir.path(), 64);
    config.reconstruct.soft_ceiling_mb = 0.00005;
    config.reconstruct.hard_ceiling_mb = 0.0001;
    let mut session = AcquisitionSession::open(config).unwrap();

    let offsets: Vec<u32> = (0..13).map(|i| i * 16).collect();
    let mut source = VecSource::new(moving_frames(&offsets));
    session.start();
    session.run(&mut source, &reporter()).unwrap();
    session.pause();

    assert!(matches!(
        session.generate_levels(&reporter()),
        Err(SlideScanError::CanvasTooLarge { .. })
    ));
    assert_eq!(session.catalog().len(), 3);

    let on_disk = Catalog::load(&session.layout().catalog_path()).unwrap();
    assert_eq!(&on_disk, session.catalog());
    assert_eq!(on_disk.level_counts().get(&0), Some(&3));
}

#[test]
fn test_close_writes_catalog() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut session = open_session(&dir);
    let offsets: Vec<u32> = (0..9).map(|i| i * 16).collect();
    let mut source = VecSource::new(moving_frames(&offsets));
    session.start();
    session.run(&mut source, &reporter()).unwrap();

    let path = session.layout().catalog_path();
    let expected = session.catalog().clone();
    let stats = session.close().unwrap();

    assert_eq!(stats.tiles_captured, 2);
    assert_eq!(Catalog::load(&path).unwrap(), expected);
}

#[test]
fn test_close_without_tiles_writes_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let session = open_session(&dir);
    let path = session.layout().catalog_path();
    session.close().unwrap();
    assert!(!path.exists());
}
