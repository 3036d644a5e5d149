//! Input handlers: enumerate raw sources and convert each into a
//! [`ContentUnit`](crate::pipeline::content::ContentUnit).
//!
//! Two variants are provided: [`FsInputHandler`] reads serialized
//! documents from the filesystem, [`DbInputHandler`] wraps existing
//! records from a [`SqliteDocumentStore`](crate::store::SqliteDocumentStore).
//! New source kinds are added as new implementations of [`InputHandler`],
//! not by subclassing.
//!
//! Enumeration ([`get_input`](InputHandler::get_input)) is fatal when it
//! fails; a missing or empty selector is a configuration error.
//! Conversion ([`handle_input`](InputHandler::handle_input)) fails per
//! item: the controller records the failure and continues with the next
//! key.

pub mod database;
pub mod fs;

pub use database::DbInputHandler;
pub use fs::{FsInputHandler, Selector};

use crate::pipeline::content::{ContentUnit, UnitKey};
use async_trait::async_trait;
use thiserror::Error;

// ── InputHandler trait ─────────────────────────────────────────────────

/// Source abstraction feeding the pipeline.
///
/// # Contract
///
/// - [`get_input`](Self::get_input) returns the full, deterministic,
///   offset-and-limit-sliced key sequence for the run, in enumeration
///   order.  Called once per run.
/// - [`handle_input`](Self::handle_input) converts one key into a
///   content unit appended to an internal pre-processed queue.  A
///   failure for one key must not affect subsequent keys.
/// - [`drain_pre_processed`](Self::drain_pre_processed) hands the queue
///   to the controller, leaving the handler's queue empty.
#[async_trait]
pub trait InputHandler: Send {
    /// Short identifier for logging (e.g. `"fs"`, `"db"`).
    fn id(&self) -> &str;

    /// Enumerate the input keys for this run, already sliced by
    /// `start`/`limit`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when the selector is unset, resolves to
    /// nothing, or enumeration itself fails.  All of these abort the run
    /// before any processing starts.
    async fn get_input(&self) -> Result<Vec<UnitKey>, InputError>;

    /// Convert one input key into a content unit on the internal queue.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when this key cannot be converted.  The
    /// caller records the failure and continues enumerating.
    async fn handle_input(&mut self, key: &UnitKey) -> Result<(), IngestError>;

    /// Take the pre-processed queue accumulated by `handle_input`.
    fn drain_pre_processed(&mut self) -> Vec<ContentUnit>;
}

// ── InputError ─────────────────────────────────────────────────────────

/// Fatal enumeration errors: configuration problems surfaced before any
/// item is processed.
#[derive(Debug, Error)]
pub enum InputError {
    /// No selector was configured for the handler.
    #[error("input selector is not set")]
    EmptySelector,

    /// The selector resolved (after the `start` offset) to zero keys.
    #[error("input selector is empty: {selector}")]
    EmptyInput {
        /// Rendered selector, for the setup-failure message.
        selector: String,
    },

    /// Enumeration itself failed (bad glob pattern, storage error).
    #[error("failed to enumerate inputs: {reason}")]
    Enumeration {
        /// What went wrong.
        reason: String,
    },
}

// ── IngestError ────────────────────────────────────────────────────────

/// A single input key could not be converted into a content unit.
///
/// Recovered locally: recorded in the pre-processing error list, after
/// which enumeration continues with the next key.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source file could not be read.
    #[error("failed to read '{key}': {source}")]
    Read {
        /// The input key.
        key: UnitKey,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source file did not deserialize into a document.
    #[error("malformed document '{key}': {source}")]
    Malformed {
        /// The input key.
        key: UnitKey,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The enumerated record vanished before it could be fetched.
    #[error("record {id} not found")]
    MissingRecord {
        /// Primary key of the missing record.
        id: i64,
    },

    /// Backing storage failed while fetching the record.
    #[error("storage error for '{key}': {reason}")]
    Storage {
        /// The input key.
        key: UnitKey,
        /// What went wrong.
        reason: String,
    },

    /// The key variant does not belong to this handler.
    #[error("handler '{handler}' cannot handle input key '{key}'")]
    UnsupportedKey {
        /// Handler identifier.
        handler: String,
        /// The offending key.
        key: UnitKey,
    },
}

/// Apply the `[start:]` offset, the emptiness check, and the `[:limit]`
/// cap, in that order, matching the enumeration contract: `EmptyInput`
/// refers to the post-offset sequence, before the limit is applied.
pub(crate) fn slice_keys(
    keys: Vec<UnitKey>,
    start: usize,
    limit: i64,
    selector: &str,
) -> Result<Vec<UnitKey>, InputError> {
    let mut keys: Vec<UnitKey> = keys.into_iter().skip(start).collect();

    if keys.is_empty() {
        return Err(InputError::EmptyInput {
            selector: selector.to_owned(),
        });
    }

    if limit > 0 {
        keys.truncate(limit as usize);
    }

    Ok(keys)
}

// ── Tests ──────────────────────────────────────────────────────────────
