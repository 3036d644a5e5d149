//! The [`PipelineController`] owns one pipeline run end to end.
//!
//! # Execution model
//!
//! 1. The builder resolves the requested step list against the
//!    [`StepRegistry`](super::registry::StepRegistry); an unknown name is
//!    a fatal configuration error; `process()` is never reached.
//! 2. `process()` calls the input handler's `get_input()` once, then
//!    `handle_input(key)` for every key in order.  Each call is
//!    independently guarded: a per-key failure is logged, recorded in
//!    the pre-processing error list, and enumeration continues.
//! 3. Each unit in queue order gets each selected step in the
//!    caller-requested order.  A step failure is recorded per unit; the
//!    remaining steps still run on the same unit and the unit stays in
//!    the batch, in order.
//! 4. Each sink receives the entire processed batch in one call; a sink
//!    failure is recorded and the next sink still runs.
//! 5. `process()` returning `Ok` is the only terminal path once setup
//!    succeeded; per-item failures never abort the run.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut controller = PipelineController::builder()
//!     .registry(registry)
//!     .content_kind("case")
//!     .input_handler(Box::new(handler))
//!     .steps(StepSelection::from_names(["normalize", "extract_refs"]))
//!     .add_sink(Arc::new(index_sink))
//!     .build()?;
//!
//! let report = controller.process().await?;
//! report.log_stats();
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::input::{InputError, InputHandler};
use crate::sink::{PostProcessingSink, SinkError};

use super::content::ContentUnit;
use super::registry::{RegistryError, StepRegistry};
use super::stats::{IngestFailure, RunReport, RunStats, SinkFailure, StepFailure};
use super::step::ProcessingStep;

/// Sentinel step name expanding to the full registered set.
pub const ALL_STEPS: &str = "all";

// ── StepSelection ──────────────────────────────────────────────────────

/// The caller-requested step list for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSelection {
    /// Every step registered for the content kind, in registry order.
    All,
    /// An explicit ordered subset; application order follows this list,
    /// not the registry's order.
    Named(Vec<String>),
}

impl StepSelection {
    /// Build a selection from step names; the [`ALL_STEPS`] sentinel
    /// anywhere in the list selects everything.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.iter().any(|n| n == ALL_STEPS) {
            Self::All
        } else {
            Self::Named(names)
        }
    }
}

// ── PipelineError ──────────────────────────────────────────────────────

/// Fatal configuration errors.
///
/// These are the only errors a controller ever returns: raised
/// synchronously during setup (or input resolution), before any item is
/// processed.  Per-item failures are recorded in the
/// [`RunReport`](super::stats::RunReport) instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `build()` was called before the pipeline was fully configured.
    #[error("pipeline is not configured: missing {what}")]
    NotConfigured {
        /// The missing piece.
        what: &'static str,
    },

    /// A requested step name is not registered for the content kind.
    #[error("requested step is not available: {name}")]
    UnknownStep {
        /// The unresolvable step name.
        name: String,
    },

    /// The registry has no configuration for the content kind.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Input enumeration failed (unset or empty selector).
    #[error(transparent)]
    Input(#[from] InputError),

    /// A destructive reset requested via `empty_content()` failed.
    #[error("failed to empty sink '{sink}': {source}")]
    EmptyFailed {
        /// The failing sink.
        sink: String,
        /// Underlying sink error.
        source: SinkError,
    },
}

// ── PipelineController ─────────────────────────────────────────────────

/// Drives pre-processing, processing, and post-processing for one
/// content kind.
///
/// All run state (queues, counters, error lists) is owned by the
/// controller instance; nothing is shared between controllers except the
/// read-only registry the builder resolved against.  A controller may be
/// re-run: each `process()` call resets the queues and per-run counters
/// but error lists accumulate until [`clear_errors`](Self::clear_errors).
pub struct PipelineController {
    content_kind: String,
    input_handler: Box<dyn InputHandler>,
    steps: Vec<(String, Arc<dyn ProcessingStep>)>,
    sinks: Vec<Arc<dyn PostProcessingSink>>,

    pre_processed: Vec<ContentUnit>,
    processed: Vec<ContentUnit>,

    stats: RunStats,
    pre_processing_errors: Vec<IngestFailure>,
    processing_errors: Vec<StepFailure>,
    post_processing_errors: Vec<SinkFailure>,
}

impl PipelineController {
    /// Start building a controller.
    #[must_use]
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    /// The content kind this controller processes.
    #[must_use]
    pub fn content_kind(&self) -> &str {
        &self.content_kind
    }

    /// Names of the selected steps, in application order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(n, _)| n.as_str())
    }

    /// Run the full pipeline once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only for input-resolution failures
    /// (unset/empty selector, enumeration failure).  Per-item and
    /// per-sink failures are recorded in the returned report.
    pub async fn process(&mut self) -> Result<RunReport, PipelineError> {
        // Fresh queues and counters per run; error lists persist.
        self.pre_processed.clear();
        self.processed.clear();
        self.stats = RunStats::default();

        let run = Uuid::new_v4();
        info!(
            run = %run,
            kind = %self.content_kind,
            handler = self.input_handler.id(),
            "starting pipeline run",
        );

        let keys = self.input_handler.get_input().await?;
        debug!(run = %run, inputs = keys.len(), "input resolved");

        // Input handling is kept separate from processing so that steps
        // can see the complete pre-processed queue.
        for key in &keys {
            match self.input_handler.handle_input(key).await {
                Ok(()) => self.stats.files_succeeded += 1,
                Err(err) => {
                    error!(key = %key, error = %err, "failed to pre-process input");
                    self.stats.files_failed += 1;
                    self.pre_processing_errors.push(IngestFailure {
                        key: key.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        self.pre_processed = self.input_handler.drain_pre_processed();
        debug!("pre-processed content: {}", self.pre_processed.len());

        self.process_content().await;

        // Each sink gets the whole batch, in order, regardless of
        // earlier sink failures.
        for sink in &self.sinks {
            if let Err(err) = sink.process(&mut self.processed).await {
                error!(sink = sink.id(), error = %err, "failed to call post-processing sink");
                self.post_processing_errors.push(SinkFailure {
                    sink: sink.id().to_owned(),
                    message: err.to_string(),
                });
            }
        }

        info!(
            run = %run,
            docs = self.stats.docs_attempted(),
            failed = self.stats.docs_failed,
            "pipeline run finished",
        );
        Ok(self.report())
    }

    /// Apply each selected step, in order, to each pre-processed unit,
    /// in queue order.
    async fn process_content(&mut self) {
        for mut unit in std::mem::take(&mut self.pre_processed) {
            let mut unit_failed = false;

            for (name, step) in &self.steps {
                if let Err(err) = step.process(&mut unit).await {
                    error!(step = %name, key = %unit.key(), error = %err, "failed to call processing step");
                    unit_failed = true;
                    self.processing_errors.push(StepFailure {
                        key: unit.key().clone(),
                        step: name.clone(),
                        message: err.to_string(),
                    });
                    // Remaining steps still run on this unit.
                }
            }

            if unit_failed {
                self.stats.docs_failed += 1;
            } else {
                self.stats.docs_succeeded += 1;
            }
            self.processed.push(unit);
        }
    }

    /// Destructively reset external state owned by the configured sinks
    /// (e.g. empty the search index) before a run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyFailed`] for the first sink whose
    /// reset fails.
    pub async fn empty_content(&self) -> Result<(), PipelineError> {
        for sink in &self.sinks {
            info!(sink = sink.id(), "emptying sink content");
            sink.empty()
                .await
                .map_err(|source| PipelineError::EmptyFailed {
                    sink: sink.id().to_owned(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Snapshot of the current counters and accumulated error lists.
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport {
            stats: self.stats,
            pre_processing_errors: self.pre_processing_errors.clone(),
            processing_errors: self.processing_errors.clone(),
            post_processing_errors: self.post_processing_errors.clone(),
        }
    }

    /// Drop all accumulated error lists.
    pub fn clear_errors(&mut self) {
        self.pre_processing_errors.clear();
        self.processing_errors.clear();
        self.post_processing_errors.clear();
    }

    /// Render the stats report plus per-step and per-sink cumulative
    /// stats through `tracing`.
    pub fn log_stats(&self) {
        self.report().log_stats();
        for (_, step) in &self.steps {
            step.log_stats();
        }
        for sink in &self.sinks {
            sink.log_stats();
        }
    }
}

// ── ControllerBuilder ──────────────────────────────────────────────────

/// Builder for [`PipelineController`].
///
/// `build()` performs the whole setup-time validation: a missing piece
/// is [`PipelineError::NotConfigured`], an unknown step name is
/// [`PipelineError::UnknownStep`]; both are fatal before any input is read.
#[derive(Default)]
pub struct ControllerBuilder {
    registry: Option<Arc<StepRegistry>>,
    content_kind: Option<String>,
    input_handler: Option<Box<dyn InputHandler>>,
    selection: Option<StepSelection>,
    sinks: Vec<Arc<dyn PostProcessingSink>>,
}

impl ControllerBuilder {
    /// Use the given step registry.
    #[must_use]
    pub fn registry(mut self, registry: Arc<StepRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the content kind whose step configuration applies.
    #[must_use]
    pub fn content_kind(mut self, kind: impl Into<String>) -> Self {
        self.content_kind = Some(kind.into());
        self
    }

    /// Set the input handler for this run.
    #[must_use]
    pub fn input_handler(mut self, handler: Box<dyn InputHandler>) -> Self {
        self.input_handler = Some(handler);
        self
    }

    /// Set the requested step list.
    #[must_use]
    pub fn steps(mut self, selection: StepSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Append a post-processing sink; sinks run in the order added.
    #[must_use]
    pub fn add_sink(mut self, sink: Arc<dyn PostProcessingSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Validate the configuration and build the controller.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotConfigured`] when the registry,
    /// content kind, input handler, or step selection is missing;
    /// [`PipelineError::Registry`] when the kind has no configured
    /// steps; [`PipelineError::UnknownStep`] when a requested name is
    /// not registered for the kind.
    pub fn build(self) -> Result<PipelineController, PipelineError> {
        let registry = self
            .registry
            .ok_or(PipelineError::NotConfigured { what: "step registry" })?;
        let content_kind = self
            .content_kind
            .ok_or(PipelineError::NotConfigured { what: "content kind" })?;
        let input_handler = self
            .input_handler
            .ok_or(PipelineError::NotConfigured { what: "input handler" })?;
        let selection = self
            .selection
            .ok_or(PipelineError::NotConfigured { what: "step selection" })?;

        let kind_steps = registry.resolve(&content_kind)?;

        let steps = match selection {
            StepSelection::All => kind_steps
                .iter()
                .map(|(name, step)| (name.to_owned(), step.clone()))
                .collect(),
            StepSelection::Named(names) => {
                let mut steps = Vec::with_capacity(names.len());
                for name in names {
                    let step = kind_steps
                        .get(&name)
                        .ok_or_else(|| PipelineError::UnknownStep { name: name.clone() })?;
                    steps.push((name, step.clone()));
                }
                steps
            }
        };

        Ok(PipelineController {
            content_kind,
            input_handler,
            steps,
            sinks: self.sinks,
            pre_processed: Vec::new(),
            processed: Vec::new(),
            stats: RunStats::default(),
            pre_processing_errors: Vec::new(),
            processing_errors: Vec::new(),
            post_processing_errors: Vec::new(),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
