//! The content-processing pipeline core.
//!
//! A run moves a batch of documents through three phases under a single
//! [`controller::PipelineController`]:
//!
//! ```text
//!   input handler            steps (ordered)           sinks (ordered)
//!   ┌────────────┐   ┌──────────────────────────┐   ┌────────────────┐
//!   │ enumerate  │   │ normalize → assign_court │   │ search index   │
//!   │ + ingest   │ → │ → extract_refs → …       │ → │ …              │
//!   └────────────┘   └──────────────────────────┘   └────────────────┘
//!    pre-processed        processed queue              whole batch
//! ```
//!
//! Failures are recovered at the narrowest scope that keeps the batch
//! moving: a bad input skips one unit, a failed step marks one unit, a
//! failed sink is recorded and the next sink runs.  Only configuration
//! and input-resolution errors abort a run.

pub mod content;
pub mod controller;
pub mod registry;
pub mod stats;
pub mod step;
