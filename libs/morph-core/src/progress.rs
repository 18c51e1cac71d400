//! Progress reporting and cooperative cancellation for the batch passes.
//!
//! Passes report after every fixed-size batch of items and after every corpus
//! file. The same points are the only places a [`CancelToken`] is checked, so a
//! cancel never interrupts one item halfway.

use crate::error::{MorphError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Items processed between two progress reports (and cancel checks).
pub const BATCH_SIZE: usize = 500;

/// A single progress event.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Building the morpheme database: `n` of `total` items tokenized.
    ScanningItems { n: usize, total: usize },
    /// Ranking items: `n` of `total` items scored.
    ScoringItems { n: usize, total: usize },
    /// Readability: measuring source `n` of `total`.
    MeasuringSource { name: String, n: usize, total: usize },
    /// Readability: planning source `n` of `total`.
    PlanningSource { name: String, n: usize, total: usize },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter when progress is not wanted.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Reports through `tracing` at info level.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ScanningItems { n, total } => {
                info!(n, total, "Scanning items");
            }
            ProgressEvent::ScoringItems { n, total } => {
                info!(n, total, "Scoring items");
            }
            ProgressEvent::MeasuringSource { name, n, total } => {
                info!(source = %name, n, total, "Measuring readability");
            }
            ProgressEvent::PlanningSource { name, n, total } => {
                info!(source = %name, n, total, "Building study plan");
            }
        }
    }
}

/// Shared cancel flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MorphError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Reporter and cancel token handed to a pass.
#[derive(Clone)]
pub struct PassControl {
    pub progress: Arc<dyn ProgressReporter>,
    pub cancel: CancelToken,
}

impl PassControl {
    pub fn new(progress: Arc<dyn ProgressReporter>, cancel: CancelToken) -> Self {
        Self { progress, cancel }
    }

    /// Report and check for cancellation. Call between units only.
    pub fn checkpoint(&self, event: ProgressEvent) -> Result<()> {
        self.progress.report(event);
        self.cancel.check()
    }
}

impl Default for PassControl {
    fn default() -> Self {
        Self::new(Arc::new(NoProgress), CancelToken::new())
    }
}
