//! SQLite-backed document store.
//!
//! Holds the case documents the database input handler enumerates.  All
//! access goes through [`tokio_rusqlite::Connection::call`] closures; the
//! connection handle is cheap to clone and safe to share.

use crate::store::StoreError;
use std::path::Path;
use tokio_rusqlite::{params, Connection, OptionalExtension};

/// One stored case document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Primary key.
    pub id: i64,
    /// Document title.
    pub title: String,
    /// Raw document body.
    pub body: String,
}

/// Document store over a single `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Open (and initialize if needed) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or the
    /// schema cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))?;
        Self::init(conn).await
    }

    /// Open an in-memory store (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS documents (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    body TEXT NOT NULL
                )",
                [],
            )
            .map(|_| ())
            .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(|err| StoreError::Storage(err.to_string()))?;

        Ok(Self { conn })
    }

    /// Insert a document, returning its primary key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on write failure.
    pub async fn insert_document(&self, title: &str, body: &str) -> Result<i64, StoreError> {
        let title = title.to_owned();
        let body = body.to_owned();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents (title, body) VALUES (?1, ?2)",
                    params![title, body],
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))
    }

    /// Enumerate document ids in primary-key order, sliced by
    /// `start`/`limit` (`limit` ≤ 0 means unbounded).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub async fn list_ids(&self, start: usize, limit: i64) -> Result<Vec<i64>, StoreError> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = if limit > 0 { limit } else { -1 };
        let offset = i64::try_from(start).unwrap_or(i64::MAX);

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT id FROM documents ORDER BY id LIMIT ?1 OFFSET ?2")
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map(params![limit, offset], |row| row.get::<_, i64>(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut ids = Vec::new();
                for row in rows {
                    ids.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(ids)
            })
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))
    }

    /// Fetch one document by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub async fn fetch(&self, id: i64) -> Result<Option<DocumentRecord>, StoreError> {
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, title, body FROM documents WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(DocumentRecord {
                            id: row.get(0)?,
                            title: row.get(1)?,
                            body: row.get(2)?,
                        })
                    },
                )
                .optional()
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(|err| StoreError::Storage(err.to_string()))
    }

    /// Total number of stored documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on query failure.
    pub async fn count(&self) -> Result<usize, StoreError> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map(|n| usize::try_from(n).unwrap_or_default())
            .map_err(|err| StoreError::Storage(err.to_string()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        let id = store.insert_document("t", "<p>b</p>").await.unwrap();

        let rec = store.fetch(id).await.unwrap().unwrap();
        assert_eq!(rec.title, "t");
        assert_eq!(rec.body, "<p>b</p>");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fetch_missing_returns_none() {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        assert!(store.fetch(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_ids_is_ordered_and_sliced() {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        for i in 0..5 {
            store
                .insert_document(&format!("doc {i}"), "b")
                .await
                .unwrap();
        }

        let all = store.list_ids(0, 0).await.unwrap();
        assert_eq!(all.len(), 5);
        let mut sorted = all.clone();
        sorted.sort_unstable();
        assert_eq!(all, sorted);

        let sliced = store.list_ids(1, 2).await.unwrap();
        assert_eq!(sliced, vec![all[1], all[2]]);
    }
}
