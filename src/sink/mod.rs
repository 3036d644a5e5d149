//! Post-processing sinks: consumers of the finished batch.
//!
//! A sink receives the *entire* processed queue in one call, not one
//! unit at a time.  Sinks run sequentially in configured order and see
//! the same unit instances; a sink may mutate units as a side effect but
//! the pipeline gives no isolation guarantee between sinks.

pub mod index;

pub use index::SqliteSearchIndexSink;

use crate::pipeline::content::ContentUnit;
use async_trait::async_trait;
use thiserror::Error;

// ── PostProcessingSink trait ───────────────────────────────────────────

/// A batch consumer run after processing completes.
#[async_trait]
pub trait PostProcessingSink: Send + Sync {
    /// Short identifier for logging and error records.
    fn id(&self) -> &str;

    /// Consume the whole processed batch.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the batch cannot be consumed.  The
    /// controller records the failure; the next sink still runs against
    /// the same batch.
    async fn process(&self, batch: &mut [ContentUnit]) -> Result<(), SinkError>;

    /// Emit cumulative statistics for this sink instance.  Default:
    /// nothing.
    fn log_stats(&self) {}

    /// Destructively reset any external state this sink owns (e.g. drop
    /// the search index).  Invoked by
    /// [`PipelineController::empty_content`](crate::pipeline::controller::PipelineController::empty_content).
    /// Default: nothing to reset.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the reset fails.
    async fn empty(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

// ── SinkError ──────────────────────────────────────────────────────────

/// An error raised by a post-processing sink.
///
/// Recovered locally by the controller: recorded in the post-processing
/// error list, after which the remaining sinks still run.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink's backing storage failed.
    #[error("storage error in sink '{sink}': {reason}")]
    Storage {
        /// Sink identifier.
        sink: String,
        /// What went wrong.
        reason: String,
    },

    /// A unit could not be serialized for the sink's target.
    #[error("serialization error in sink '{sink}': {source}")]
    Serialization {
        /// Sink identifier.
        sink: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Catch-all for unexpected sink failures.
    #[error("internal error in sink '{sink}': {source}")]
    Internal {
        /// Sink identifier.
        sink: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
