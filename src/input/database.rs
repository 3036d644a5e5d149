//! Database input handler: wraps existing store records as content
//! units.
//!
//! Unlike the filesystem variant there is no parse step: the enumerated
//! record already has the document's shape and is wrapped directly.  The
//! handler therefore has no malformed-input failure path; the only
//! per-item errors it can record are storage I/O failures.

use super::{slice_keys, IngestError, InputError, InputHandler};
use crate::pipeline::content::{ContentUnit, UnitKey};
use crate::store::SqliteDocumentStore;
use async_trait::async_trait;

/// Enumerates case documents from a [`SqliteDocumentStore`] in
/// primary-key order, applying the same `start`/`limit` slicing as the
/// filesystem handler.
pub struct DbInputHandler {
    store: SqliteDocumentStore,
    start: usize,
    limit: i64,
    pre_processed: Vec<ContentUnit>,
}

impl DbInputHandler {
    /// Create a handler over the given store, unbounded and starting at
    /// offset zero.
    #[must_use]
    pub fn new(store: SqliteDocumentStore) -> Self {
        Self {
            store,
            start: 0,
            limit: 0,
            pre_processed: Vec::new(),
        }
    }

    /// Cap enumeration at `limit` records (≤ 0 means unbounded).
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Skip the first `start` records of the query.
    #[must_use]
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }
}

#[async_trait]
impl InputHandler for DbInputHandler {
    fn id(&self) -> &str {
        "db"
    }

    async fn get_input(&self) -> Result<Vec<UnitKey>, InputError> {
        // Slicing happens in the query; slice_keys only re-checks
        // emptiness so the error shape matches the filesystem variant.
        let ids = self
            .store
            .list_ids(self.start, self.limit)
            .await
            .map_err(|err| InputError::Enumeration {
                reason: err.to_string(),
            })?;

        let keys = ids.into_iter().map(UnitKey::Record).collect();
        slice_keys(keys, 0, 0, "documents query")
    }

    async fn handle_input(&mut self, key: &UnitKey) -> Result<(), IngestError> {
        let UnitKey::Record(id) = key else {
            return Err(IngestError::UnsupportedKey {
                handler: self.id().to_owned(),
                key: key.clone(),
            });
        };

        let record = self
            .store
            .fetch(*id)
            .await
            .map_err(|err| IngestError::Storage {
                key: key.clone(),
                reason: err.to_string(),
            })?
            .ok_or(IngestError::MissingRecord { id: *id })?;

        // The record passes through unchanged: no conversion, no
        // validation.
        self.pre_processed
            .push(ContentUnit::new(key.clone(), record.title, record.body));
        Ok(())
    }

    fn drain_pre_processed(&mut self) -> Vec<ContentUnit> {
        std::mem::take(&mut self.pre_processed)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store(n: usize) -> SqliteDocumentStore {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        for i in 0..n {
            store
                .insert_document(&format!("case {i}"), &format!("<p>body {i}</p>"))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn enumerates_in_primary_key_order() {
        let store = seeded_store(5).await;
        let handler = DbInputHandler::new(store);
        let keys = handler.get_input().await.unwrap();
        assert_eq!(keys.len(), 5);

        let ids: Vec<i64> = keys
            .iter()
            .map(|k| match k {
                UnitKey::Record(id) => *id,
                UnitKey::Path(_) => panic!("db handler produced a path key"),
            })
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn start_and_limit_slice_the_query() {
        let store = seeded_store(10).await;
        let handler = DbInputHandler::new(store).with_start(3).with_limit(4);
        assert_eq!(handler.get_input().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn empty_query_is_empty_input() {
        let store = seeded_store(0).await;
        let handler = DbInputHandler::new(store);
        assert!(matches!(
            handler.get_input().await,
            Err(InputError::EmptyInput { .. })
        ));
    }

    #[tokio::test]
    async fn records_pass_through_unchanged() {
        let store = seeded_store(2).await;
        let mut handler = DbInputHandler::new(store);
        let keys = handler.get_input().await.unwrap();
        for key in &keys {
            handler.handle_input(key).await.unwrap();
        }

        let units = handler.drain_pre_processed();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].title, "case 0");
        assert_eq!(units[0].body, "<p>body 0</p>");
        assert!(units[0].annotations.is_empty());
    }

    #[tokio::test]
    async fn missing_record_is_a_per_item_error() {
        let store = seeded_store(1).await;
        let mut handler = DbInputHandler::new(store);
        let err = handler
            .handle_input(&UnitKey::Record(999))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::MissingRecord { id: 999 }));
    }
}
