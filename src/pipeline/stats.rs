//! Run statistics and error bookkeeping.
//!
//! Every per-item failure in a run increments exactly one failure counter
//! and appends to exactly one of three typed error lists; the run itself
//! keeps going.  [`RunReport`] is the snapshot handed back to the caller
//! once a run reaches its terminal state.

use crate::pipeline::content::UnitKey;
use serde::Serialize;
use tracing::{debug, info, warn};

// ── RunStats ───────────────────────────────────────────────────────────

/// Per-run counters.
///
/// `files` counts input keys through pre-processing (enumerated raw
/// inputs); `docs` counts content units through the processing stage.
/// Counters reset at the start of each `process()` call so that
/// re-running a controller never double-counts successes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Input keys successfully converted into content units.
    pub files_succeeded: usize,
    /// Input keys that failed ingestion.
    pub files_failed: usize,
    /// Units that passed every selected step.
    pub docs_succeeded: usize,
    /// Units with at least one step failure.
    pub docs_failed: usize,
}

impl RunStats {
    /// Total input keys attempted this run.
    #[must_use]
    pub fn files_attempted(&self) -> usize {
        self.files_succeeded + self.files_failed
    }

    /// Total units attempted this run.
    #[must_use]
    pub fn docs_attempted(&self) -> usize {
        self.docs_succeeded + self.docs_failed
    }
}

// ── Failure records ────────────────────────────────────────────────────

/// A recorded pre-processing failure: one input key that could not be
/// converted into a content unit.
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    /// The input key that failed.
    pub key: UnitKey,
    /// Rendered error message.
    pub message: String,
}

/// A recorded processing failure: one step failing on one unit.
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    /// Identity of the unit the step failed on.
    pub key: UnitKey,
    /// Name of the failing step.
    pub step: String,
    /// Rendered error message.
    pub message: String,
}

/// A recorded post-processing failure: one sink failing on the batch.
#[derive(Debug, Clone, Serialize)]
pub struct SinkFailure {
    /// Identifier of the failing sink.
    pub sink: String,
    /// Rendered error message.
    pub message: String,
}

// ── RunReport ──────────────────────────────────────────────────────────

/// Snapshot of counters and error lists after a run reaches `Done`.
///
/// Error lists accumulate across runs of the same controller unless the
/// caller clears them, so a report taken after the second run may contain
/// entries from the first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Per-run counters (reset each run).
    pub stats: RunStats,
    /// Failures recorded while converting input keys into units.
    pub pre_processing_errors: Vec<IngestFailure>,
    /// Failures recorded while applying steps to units.
    pub processing_errors: Vec<StepFailure>,
    /// Failures recorded while running post-processing sinks.
    pub post_processing_errors: Vec<SinkFailure>,
}

impl RunReport {
    /// True when no failure of any kind has been recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.pre_processing_errors.is_empty()
            && self.processing_errors.is_empty()
            && self.post_processing_errors.is_empty()
    }

    /// Render the report through `tracing`: counters at info, non-empty
    /// error lists at warn with per-entry details at debug.
    pub fn log_stats(&self) {
        info!(target: "lexmill::stats", "processing stats:");
        info!(
            target: "lexmill::stats",
            "- successful files: {} (failed: {})",
            self.stats.files_succeeded,
            self.stats.files_failed,
        );
        info!(
            target: "lexmill::stats",
            "- successful documents: {} (failed: {})",
            self.stats.docs_succeeded,
            self.stats.docs_failed,
        );

        if !self.pre_processing_errors.is_empty() {
            warn!(
                target: "lexmill::stats",
                "pre-processing errors: {}",
                self.pre_processing_errors.len(),
            );
            for e in &self.pre_processing_errors {
                debug!(target: "lexmill::stats", key = %e.key, "{}", e.message);
            }
        }

        if !self.processing_errors.is_empty() {
            warn!(
                target: "lexmill::stats",
                "processing errors: {}",
                self.processing_errors.len(),
            );
            for e in &self.processing_errors {
                debug!(target: "lexmill::stats", key = %e.key, step = %e.step, "{}", e.message);
            }
        }

        if !self.post_processing_errors.is_empty() {
            warn!(
                target: "lexmill::stats",
                "post-processing errors: {}",
                self.post_processing_errors.len(),
            );
            for e in &self.post_processing_errors {
                debug!(target: "lexmill::stats", sink = %e.sink, "{}", e.message);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
