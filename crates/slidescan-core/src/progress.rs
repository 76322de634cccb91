use std::fmt;

/// Long-running stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Capturing,
    Composing,
    Downscaling,
    Retiling,
    Placing,
    Saving,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capturing => write!(f, "Capturing tiles"),
            Self::Composing => write!(f, "Composing level 0"),
            Self::Downscaling => write!(f, "Downscaling"),
            Self::Retiling => write!(f, "Re-tiling"),
            Self::Placing => write!(f, "Placing tiles"),
            Self::Saving => write!(f, "Saving"),
        }
    }
}

/// Thread-safe progress reporting.
///
/// Implementors can use this to drive progress bars or logging. All methods
/// have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage, if known.
    fn begin_stage(&self, _stage: Stage, _total_items: Option<usize>) {}

    /// `items_done` work items within the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Reporter that ignores every event.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
