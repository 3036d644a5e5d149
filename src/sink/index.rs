//! Search-index sink backed by SQLite.
//!
//! Stands in for the platform's remote search index: each processed unit
//! is upserted into a local `search_index` table keyed by the unit's
//! identity, with annotations serialized alongside the text so the index
//! is self-contained.

use super::{PostProcessingSink, SinkError};
use crate::pipeline::content::ContentUnit;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

const SINK_ID: &str = "search_index";

/// Indexes the processed batch into a local SQLite table.
pub struct SqliteSearchIndexSink {
    conn: Connection,
    indexed: AtomicUsize,
}

impl SqliteSearchIndexSink {
    /// Open (and initialize if needed) an index at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the database cannot be opened or the
    /// schema cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let conn = Connection::open(path).await.map_err(storage_err)?;
        Self::init(conn).await
    }

    /// Open an in-memory index (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the database cannot be opened.
    pub async fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory().await.map_err(storage_err)?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, SinkError> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS search_index (
                    key TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    text TEXT NOT NULL,
                    annotations TEXT NOT NULL
                )",
                [],
            )
            .map(|_| ())
            .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(storage_err)?;

        Ok(Self {
            conn,
            indexed: AtomicUsize::new(0),
        })
    }

    /// Number of documents currently in the index.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] on query failure.
    pub async fn count(&self) -> Result<usize, SinkError> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM search_index", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map(|n| usize::try_from(n).unwrap_or_default())
            .map_err(storage_err)
    }

    /// Fetch the indexed text for a key, if present.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] on query failure.
    pub async fn fetch_text(&self, key: &str) -> Result<Option<String>, SinkError> {
        let key = key.to_owned();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT text FROM search_index WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_err)
    }
}

fn storage_err(err: tokio_rusqlite::Error) -> SinkError {
    SinkError::Storage {
        sink: SINK_ID.to_owned(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl PostProcessingSink for SqliteSearchIndexSink {
    fn id(&self) -> &str {
        SINK_ID
    }

    async fn process(&self, batch: &mut [ContentUnit]) -> Result<(), SinkError> {
        // Serialize up front so a bad unit fails before any row is
        // written.
        let mut rows = Vec::with_capacity(batch.len());
        for unit in batch.iter() {
            let annotations =
                serde_json::to_string(&unit.annotations).map_err(|source| {
                    SinkError::Serialization {
                        sink: SINK_ID.to_owned(),
                        source,
                    }
                })?;
            rows.push((
                unit.key().to_string(),
                unit.title.clone(),
                unit.text().to_owned(),
                annotations,
            ));
        }

        let written = rows.len();
        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                for (key, title, text, annotations) in rows {
                    tx.execute(
                        "INSERT OR REPLACE INTO search_index (key, title, text, annotations)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![key, title, text, annotations],
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_err)?;

        self.indexed.fetch_add(written, Ordering::Relaxed);
        Ok(())
    }

    fn log_stats(&self) {
        info!(
            target: "lexmill::sink",
            "search index sink: {} documents indexed (cumulative)",
            self.indexed.load(Ordering::Relaxed),
        );
    }

    async fn empty(&self) -> Result<(), SinkError> {
        self.conn
            .call(|conn| {
                conn.execute("DELETE FROM search_index", [])
                    .map(|_| ())
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_err)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::content::{Annotation, UnitKey};

    fn unit(id: i64, body: &str) -> ContentUnit {
        ContentUnit::new(UnitKey::Record(id), format!("case {id}"), body)
    }

    #[tokio::test]
    async fn indexes_the_whole_batch() {
        let sink = SqliteSearchIndexSink::open_in_memory().await.unwrap();
        let mut batch = vec![unit(1, "one"), unit(2, "two")];

        sink.process(&mut batch).await.unwrap();
        assert_eq!(sink.count().await.unwrap(), 2);
        assert_eq!(
            sink.fetch_text("record:1").await.unwrap().as_deref(),
            Some("one")
        );
    }

    #[tokio::test]
    async fn reindexing_upserts_instead_of_duplicating() {
        let sink = SqliteSearchIndexSink::open_in_memory().await.unwrap();
        let mut batch = vec![unit(1, "old")];
        sink.process(&mut batch).await.unwrap();

        batch[0].body = "new".to_owned();
        sink.process(&mut batch).await.unwrap();

        assert_eq!(sink.count().await.unwrap(), 1);
        assert_eq!(
            sink.fetch_text("record:1").await.unwrap().as_deref(),
            Some("new")
        );
    }

    #[tokio::test]
    async fn indexed_text_prefers_normalized_annotation() {
        let sink = SqliteSearchIndexSink::open_in_memory().await.unwrap();
        let mut u = unit(3, "<p>html</p>");
        u.annotations.push(Annotation::new(Annotation::TEXT, "html"));
        let mut batch = vec![u];

        sink.process(&mut batch).await.unwrap();
        assert_eq!(
            sink.fetch_text("record:3").await.unwrap().as_deref(),
            Some("html")
        );
    }

    #[tokio::test]
    async fn empty_clears_the_index() {
        let sink = SqliteSearchIndexSink::open_in_memory().await.unwrap();
        let mut batch = vec![unit(1, "one")];
        sink.process(&mut batch).await.unwrap();

        sink.empty().await.unwrap();
        assert_eq!(sink.count().await.unwrap(), 0);
    }
}
