//! Persistence collaborators.
//!
//! The pipeline treats relational storage as an opaque side effect
//! reached through narrow seams: [`SqliteDocumentStore`] backs the
//! database input handler, and sinks own whatever storage they write to.

pub mod sqlite;

pub use sqlite::{DocumentRecord, SqliteDocumentStore};

use thiserror::Error;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database operation failed.
    #[error("storage error: {0}")]
    Storage(String),
}
