//! The [`ProcessingStep`] trait, the transformation contract of the
//! pipeline.
//!
//! A step receives one [`ContentUnit`] and enriches it in place.  Steps
//! are composed into a caller-requested sequence by the
//! [`PipelineController`](super::controller::PipelineController); each
//! step fails independently and a failure never removes the unit from
//! the batch.
//!
//! # Implementing a step
//!
//! ```rust,ignore
//! use lexmill::pipeline::content::ContentUnit;
//! use lexmill::pipeline::step::{ProcessingStep, StepError};
//!
//! struct MyStep;
//!
//! #[async_trait::async_trait]
//! impl ProcessingStep for MyStep {
//!     fn id(&self) -> &str { "my_step" }
//!
//!     async fn process(&self, unit: &mut ContentUnit) -> Result<(), StepError> {
//!         // enrichment logic …
//!         Ok(())
//!     }
//! }
//! ```

use super::content::ContentUnit;
use async_trait::async_trait;
use thiserror::Error;

// ── ProcessingStep trait ───────────────────────────────────────────────

/// A single named transformation applied to one content unit.
///
/// # Contract
///
/// - [`process`](Self::process) mutates the unit in place and must be
///   **idempotent**: when the markers the step would produce are already
///   present, the step is a no-op.  Running the full selected step list
///   over an already-processed unit must cause no further observable
///   state change.
/// - A step must not mutate internal state in a way that changes the
///   result of subsequent calls; cumulative counters for
///   [`log_stats`](Self::log_stats) are the only expected interior
///   mutability.
/// - Return `Err(StepError)` when the unit cannot be processed.  The
///   controller records the failure and keeps going, both with the
///   remaining steps for this unit and with the rest of the batch.
#[async_trait]
pub trait ProcessingStep: Send + Sync {
    /// Registry name of this step (e.g. `"extract_refs"`).
    ///
    /// Used for logging, error records, and step selection.
    fn id(&self) -> &str;

    /// Apply this step to the given unit.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] if the unit cannot be processed.  The error
    /// is recorded per unit; it never aborts the batch.
    async fn process(&self, unit: &mut ContentUnit) -> Result<(), StepError>;

    /// Emit cumulative statistics for this step instance.
    ///
    /// Called by the controller's stats reporting.  Default: nothing.
    fn log_stats(&self) {}
}

// ── StepError ──────────────────────────────────────────────────────────

/// An error raised while applying a processing step to one unit.
///
/// Recovered locally by the controller: recorded in the processing error
/// list, after which the remaining steps still run on the same
/// (possibly unmodified) unit.
#[derive(Debug, Error)]
pub enum StepError {
    /// The unit is missing data the step needs.
    #[error("step '{step}' missing expected input: {what}")]
    MissingInput {
        /// Step identifier.
        step: String,
        /// What was expected.
        what: String,
    },

    /// The unit's payload could not be interpreted by this step.
    #[error("step '{step}' cannot process unit: {reason}")]
    InvalidContent {
        /// Step identifier.
        step: String,
        /// What went wrong.
        reason: String,
    },

    /// Catch-all for unexpected failures inside a step.
    #[error("internal error in step '{step}': {source}")]
    Internal {
        /// Step identifier.
        step: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ── Tests ──────────────────────────────────────────────────────────────
