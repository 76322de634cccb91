use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::SessionConfig;
use crate::error::{Result, SlideScanError};
use crate::io::layout::OutputLayout;
use crate::io::source::FrameSource;
use crate::motion::{build_estimator, DisplacementEstimator, Estimate};
use crate::progress::{ProgressReporter, Stage};
use crate::pyramid::generate_levels;
use crate::tile::Tile;

use super::controller::{CaptureController, CaptureEvent, ControllerState};
use super::grid::GridIndex;
use super::scan_map::ScanMap;

/// Counters for one acquisition session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_seen: u64,
    /// Frames the estimator could not match (first frame included).
    pub frames_skipped: u64,
    pub tiles_captured: u64,
    /// Absolute position of the last capture.
    pub position: (i64, i64),
}

/// One scan: estimator, controller, grid index and scan map behind a single
/// open / scan / close lifecycle.
///
/// The catalog is only written by [`flush`](Self::flush), [`close`](Self::close)
/// and [`generate_levels`](Self::generate_levels). Tile images are written as
/// they are captured.
pub struct AcquisitionSession {
    config: SessionConfig,
    estimator: Box<dyn DisplacementEstimator>,
    controller: CaptureController,
    grid: GridIndex,
    scan_map: ScanMap,
    frames_seen: u64,
    frames_skipped: u64,
}

impl AcquisitionSession {
    /// Validate the config and create the output directory tree.
    pub fn open(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let layout = OutputLayout::new(&config.output);
        layout.create_dirs()?;

        let step = config.step_size();
        info!(
            output = %layout.root().display(),
            tile_size = config.tile_size,
            step,
            estimator = %config.estimator.method,
            "Opened acquisition session"
        );

        Ok(Self {
            estimator: build_estimator(&config.estimator),
            controller: CaptureController::new(step, config.position_policy),
            grid: GridIndex::new(
                layout,
                config.tile_size,
                step,
                config.capture_quality,
                config.naming.codec(),
            ),
            scan_map: ScanMap::new(),
            frames_seen: 0,
            frames_skipped: 0,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        self.grid.layout()
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    pub fn catalog(&self) -> &Catalog {
        self.grid.catalog()
    }

    pub fn scan_map(&self) -> &ScanMap {
        &self.scan_map
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_seen: self.frames_seen,
            frames_skipped: self.frames_skipped,
            tiles_captured: self.grid.captured(),
            position: self.controller.position(),
        }
    }

    pub fn start(&mut self) {
        self.controller.start();
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    /// Return to `Idle`, dropping position, estimator state and the
    /// in-memory catalog. Files already written stay on disk.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.estimator.reset();
        self.grid.clear();
        self.scan_map.clear();
        self.frames_seen = 0;
        self.frames_skipped = 0;
        info!("Acquisition session reset");
    }

    /// Run one frame through estimation and the capture decision.
    ///
    /// Frames are ignored unless scanning. A failed capture pauses the
    /// session and returns the error.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<Option<Tile>> {
        if !self.controller.is_scanning() {
            return Ok(None);
        }
        self.frames_seen += 1;

        let estimate = self.estimator.estimate(frame);
        if let Estimate::Unmatched(reason) = &estimate {
            self.frames_skipped += 1;
            debug!(frame = self.frames_seen, %reason, "Frame skipped");
        }

        match self.controller.on_estimate(&estimate) {
            Some(event) => self.capture(frame, event).map(Some),
            None => Ok(None),
        }
    }

    /// Capture `frame` at the current accumulated position, ignoring the
    /// step threshold. Works in every state.
    pub fn force_capture(&mut self, frame: &RgbImage) -> Result<Tile> {
        let event = self.controller.force_capture();
        self.capture(frame, event)
    }

    fn capture(&mut self, frame: &RgbImage, event: CaptureEvent) -> Result<Tile> {
        match self.grid.on_capture(frame, event.x, event.y) {
            Ok(tile) => {
                self.scan_map.mark(tile.row, tile.column);
                Ok(tile)
            }
            Err(e) => {
                warn!(x = event.x, y = event.y, error = %e, "Capture failed, pausing");
                self.controller.pause();
                Err(e)
            }
        }
    }

    /// Drain `source` while the session is scanning.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        reporter: &Arc<dyn ProgressReporter>,
    ) -> Result<SessionStats> {
        reporter.begin_stage(Stage::Capturing, source.len_hint());
        let mut done = 0;
        while self.controller.is_scanning() {
            let Some(frame) = source.next_frame()? else {
                break;
            };
            self.process_frame(&frame)?;
            done += 1;
            reporter.advance(done);
        }
        reporter.finish_stage();

        let stats = self.stats();
        info!(
            frames = stats.frames_seen,
            skipped = stats.frames_skipped,
            tiles = stats.tiles_captured,
            "Frame source drained"
        );
        Ok(stats)
    }

    /// Build levels 1..N from the level-0 records and atomically replace the
    /// catalog file with every level. Refused while scanning.
    ///
    /// The current catalog is written first, so a failed generation still
    /// leaves the captured tiles reachable on disk.
    pub fn generate_levels(&mut self, reporter: &Arc<dyn ProgressReporter>) -> Result<&Catalog> {
        if self.controller.is_scanning() {
            return Err(SlideScanError::ScanInProgress);
        }
        self.flush()?;
        let catalog = generate_levels(
            self.grid.catalog(),
            self.grid.layout(),
            &self.config,
            reporter,
        )?;
        catalog.save(&self.grid.layout().catalog_path())?;
        self.grid.replace_catalog(catalog);
        Ok(self.grid.catalog())
    }

    /// Write the catalog if at least one tile exists. Returns whether a file
    /// was written.
    pub fn flush(&self) -> Result<bool> {
        let catalog = self.grid.catalog();
        if catalog.is_empty() {
            warn!("No tiles captured, catalog not written");
            return Ok(false);
        }
        catalog.save(&self.grid.layout().catalog_path())?;
        Ok(true)
    }

    /// Flush and end the session.
    pub fn close(mut self) -> Result<SessionStats> {
        self.controller.pause();
        self.flush()?;
        Ok(self.stats())
    }
}
