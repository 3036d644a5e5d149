//! ```text
//! PipelineConfig ─┬─► ConfigBuilder ─► Runtime Config
//!                 │                     │
//!                 │                     ├─► InputHandler ──► pre-processed queue
//!                 │                     │     ├─► FsInputHandler (JSON files/dirs)
//!                 │                     │     └─► DbInputHandler (document store)
//!                 │                     │
//!                 │                     ├─► PipelineController ──► ProcessingSteps
//!                 │                     │     ├─► Normalize
//!                 │                     │     ├─► AssignCourt
//!                 │                     │     ├─► ExtractRefs
//!                 │                     │     └─► SetPrivate
//!                 │                     │
//!                 │                     └─► PostProcessingSinks ──► SqliteSearchIndexSink
//!                 │
//!                 └─► StepRegistry (step table, resolved at startup)
//! ```
//!
//! # lexmill
//!
//! **Batch content-processing pipeline for legal-case documents.**
//!
//! `lexmill` takes raw case documents from a filesystem or database
//! source, runs them through an ordered, configurable set of processing
//! steps (HTML normalization, court assignment, statute-reference
//! extraction, privacy flagging), and hands the finished batch to
//! post-processing sinks such as a search index.  Per-item failures are
//! recorded and never abort a run; only configuration and input
//! resolution errors are fatal.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lexmill::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ConfigBuilder::new().with_file("lexmill.toml")?.with_env().build()?;
//!
//! let registry = Arc::new(register_case_steps(StepRegistry::builder()).build(&config.steps)?);
//!
//! let handler = FsInputHandler::new(config.run.input.clone())
//!     .with_start(config.run.start)
//!     .with_limit(config.run.limit);
//!
//! let mut controller = PipelineController::builder()
//!     .registry(registry)
//!     .content_kind("case")
//!     .input_handler(Box::new(handler))
//!     .steps(StepSelection::from_names(config.run.steps.clone()))
//!     .add_sink(Arc::new(SqliteSearchIndexSink::open("index.db").await?))
//!     .build()?;
//!
//! let report = controller.process().await?;
//! report.log_stats();
//! ```
//!
//! ## Modules
//!
//! - [`config`] – Run configuration, builder pattern, file/env loading
//! - [`pipeline`] – Controller, step registry, content types, run stats
//! - [`input`] – Input handlers (filesystem, database)
//! - [`steps`] – Built-in processing steps for case content
//! - [`sink`] – Post-processing sinks (search index)
//! - [`store`] – SQLite document store backing the database input

#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod input;
pub mod pipeline;
pub mod sink;
pub mod steps;
pub mod store;

/// Re-exports for convenient access to core types
pub mod prelude {
    pub use crate::config::{ConfigBuilder, InputHandlerKind, PipelineConfig, RunConfig};
    pub use crate::input::{DbInputHandler, FsInputHandler, InputHandler, Selector};
    pub use crate::pipeline::content::{Annotation, ContentUnit, UnitKey};
    pub use crate::pipeline::controller::{
        ControllerBuilder, PipelineController, PipelineError, StepSelection,
    };
    pub use crate::pipeline::registry::{RegistryBuilder, StepRegistry};
    pub use crate::pipeline::stats::{RunReport, RunStats};
    pub use crate::pipeline::step::{ProcessingStep, StepError};
    pub use crate::sink::{PostProcessingSink, SinkError, SqliteSearchIndexSink};
    pub use crate::steps::register_case_steps;
    pub use crate::store::SqliteDocumentStore;
}
