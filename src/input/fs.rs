//! Filesystem input handler: reads serialized case documents from
//! files and directory trees.

use super::{slice_keys, IngestError, InputError, InputHandler};
use crate::pipeline::content::{ContentUnit, UnitKey};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Glob suffix appended to a directory selector for recursive expansion.
const DIR_PATTERN: &str = "/**/*";

// ── Selector ───────────────────────────────────────────────────────────

/// Caller-supplied specification of which files to enumerate.
///
/// A path selector names a single file or a directory to expand
/// recursively; a list selector concatenates the expansion of each
/// element in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single file or directory.
    One(PathBuf),
    /// Several files or directories, enumerated in list order.
    Many(Vec<PathBuf>),
}

impl Selector {
    fn describe(&self) -> String {
        match self {
            Self::One(p) => p.display().to_string(),
            Self::Many(ps) => ps
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<PathBuf> for Selector {
    fn from(path: PathBuf) -> Self {
        Self::One(path)
    }
}

impl From<&Path> for Selector {
    fn from(path: &Path) -> Self {
        Self::One(path.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for Selector {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Many(paths)
    }
}

// ── RawDocument ────────────────────────────────────────────────────────

/// On-disk document shape: the serialized form produced by the export
/// side of the platform.  Only the fields the pipeline needs are read.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    title: String,
    content: String,
}

// ── FsInputHandler ─────────────────────────────────────────────────────

/// Reads content files for initial processing from the file system.
///
/// Enumeration resolves the selector into a deterministic, ordered key
/// sequence: directories expand recursively and sort lexically, single
/// files pass through as-is, and list selectors concatenate per-element
/// results in list order without a further global sort.
///
/// ```rust,ignore
/// let mut handler = FsInputHandler::new(Selector::One("workingdir/cases".into()))
///     .with_limit(20);
/// let keys = handler.get_input().await?;
/// ```
#[derive(Default)]
pub struct FsInputHandler {
    selector: Option<Selector>,
    start: usize,
    limit: i64,
    pre_processed: Vec<ContentUnit>,
}

impl FsInputHandler {
    /// Create a handler for the given selector, unbounded and starting
    /// at offset zero.
    #[must_use]
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Cap enumeration at `limit` keys (≤ 0 means unbounded).
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Skip the first `start` keys of the resolved sequence.
    #[must_use]
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Resolve one selector element into sorted file paths.
    ///
    /// A directory expands recursively via [`DIR_PATTERN`] and sorts its
    /// matches; a file is used as-is; anything else resolves to nothing.
    fn resolve_element(path: &Path) -> Result<Vec<PathBuf>, InputError> {
        if path.is_dir() {
            // The base path is literal; only DIR_PATTERN carries glob
            // syntax.  Escape it so bracketed or starred directory names
            // enumerate correctly.
            let base = glob::Pattern::escape(&path.display().to_string());
            let pattern = format!("{base}{DIR_PATTERN}");
            let entries = glob::glob(&pattern).map_err(|err| InputError::Enumeration {
                reason: format!("invalid glob pattern '{pattern}': {err}"),
            })?;

            let mut files = Vec::new();
            for entry in entries {
                match entry {
                    Ok(p) if p.is_file() => files.push(p),
                    Ok(_) => {}
                    Err(err) => {
                        // Unreadable directory entries are skipped, not fatal.
                        warn!(error = %err, "skipping unreadable entry during enumeration");
                    }
                }
            }
            files.sort();
            Ok(files)
        } else if path.is_file() {
            Ok(vec![path.to_path_buf()])
        } else {
            Ok(Vec::new())
        }
    }

    fn resolve_selector(selector: &Selector) -> Result<Vec<PathBuf>, InputError> {
        match selector {
            Selector::One(path) => Self::resolve_element(path),
            Selector::Many(paths) => {
                let mut all = Vec::new();
                for path in paths {
                    all.extend(Self::resolve_element(path)?);
                }
                Ok(all)
            }
        }
    }
}

#[async_trait]
impl InputHandler for FsInputHandler {
    fn id(&self) -> &str {
        "fs"
    }

    async fn get_input(&self) -> Result<Vec<UnitKey>, InputError> {
        let selector = self.selector.as_ref().ok_or(InputError::EmptySelector)?;

        let keys = Self::resolve_selector(selector)?
            .into_iter()
            .map(UnitKey::Path)
            .collect();

        slice_keys(keys, self.start, self.limit, &selector.describe())
    }

    async fn handle_input(&mut self, key: &UnitKey) -> Result<(), IngestError> {
        let UnitKey::Path(path) = key else {
            return Err(IngestError::UnsupportedKey {
                handler: self.id().to_owned(),
                key: key.clone(),
            });
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Read {
                key: key.clone(),
                source,
            })?;

        let doc: RawDocument =
            serde_json::from_str(&raw).map_err(|source| IngestError::Malformed {
                key: key.clone(),
                source,
            })?;

        self.pre_processed
            .push(ContentUnit::new(key.clone(), doc.title, doc.content));
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
    use std::fs;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, name: &str, title: &str) {
        let body = format!(r#"{{"title": "{title}", "content": "<p>{title}</p>"}}"#);
        fs::write(dir.join(name), body).unwrap();
    }

    fn paths(keys: &[UnitKey]) -> Vec<PathBuf> {
        keys.iter()
            .map(|k| match k {
                UnitKey::Path(p) => p.clone(),
                UnitKey::Record(_) => panic!("fs handler produced a record key"),
            })
            .collect()
    }

    #[tokio::test]
    async fn unset_selector_fails() {
        let handler = FsInputHandler::default();
        assert!(matches!(
            handler.get_input().await,
            Err(InputError::EmptySelector)
        ));
    }

    #[tokio::test]
    async fn directory_enumerates_recursively_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        write_doc(dir.path(), "b.json", "b");
        write_doc(dir.path(), "a.json", "a");
        write_doc(&sub, "c.json", "c");

        let handler = FsInputHandler::new(dir.path());
        let keys = handler.get_input().await.unwrap();
        let got = paths(&keys);

        let mut expected = got.clone();
        expected.sort();
        assert_eq!(got, expected, "enumeration must be sorted");
        assert_eq!(got.len(), 3);
        assert!(got.iter().any(|p| p.ends_with("sub/c.json")));
    }

    #[tokio::test]
    async fn list_selector_preserves_element_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_doc(first.path(), "z.json", "z");
        write_doc(second.path(), "a.json", "a");

        // second listed before first: its files must come first.
        let handler = FsInputHandler::new(vec![
            second.path().to_path_buf(),
            first.path().to_path_buf(),
        ]);
        let keys = handler.get_input().await.unwrap();
        let got = paths(&keys);
        assert!(got[0].ends_with("a.json"));
        assert!(got[1].ends_with("z.json"));
    }

    #[tokio::test]
    async fn directory_name_with_glob_metacharacters_enumerates() {
        let dir = TempDir::new().unwrap();
        let tricky = dir.path().join("cases[1]");
        fs::create_dir(&tricky).unwrap();
        write_doc(&tricky, "a.json", "a");
        write_doc(&tricky, "b.json", "b");

        let handler = FsInputHandler::new(tricky);
        let keys = handler.get_input().await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn single_file_selector_passes_through() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "only.json", "only");

        let handler = FsInputHandler::new(dir.path().join("only.json"));
        let keys = handler.get_input().await.unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn start_and_limit_slice_the_sequence() {
        let dir = TempDir::new().unwrap();
        for i in 0..25 {
            write_doc(dir.path(), &format!("{i:02}.json"), &format!("doc {i}"));
        }

        let handler = FsInputHandler::new(dir.path()).with_limit(20);
        assert_eq!(handler.get_input().await.unwrap().len(), 20);

        let handler = FsInputHandler::new(dir.path()).with_start(10).with_limit(20);
        assert_eq!(handler.get_input().await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn offset_past_end_is_empty_input() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "a.json", "a");

        let handler = FsInputHandler::new(dir.path()).with_start(5);
        assert!(matches!(
            handler.get_input().await,
            Err(InputError::EmptyInput { .. })
        ));
    }

    #[tokio::test]
    async fn handle_input_parses_documents() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "a.json", "Some case");

        let mut handler = FsInputHandler::new(dir.path());
        let keys = handler.get_input().await.unwrap();
        handler.handle_input(&keys[0]).await.unwrap();

        let units = handler.drain_pre_processed();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "Some case");
        assert_eq!(units[0].key(), &keys[0]);
        assert!(handler.drain_pre_processed().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_a_per_item_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "not json at all").unwrap();

        let mut handler = FsInputHandler::new(dir.path());
        let keys = handler.get_input().await.unwrap();
        let err = handler.handle_input(&keys[0]).await.unwrap_err();
        assert!(matches!(err, IngestError::Malformed { .. }));
        assert!(handler.drain_pre_processed().is_empty());
    }

    #[tokio::test]
    async fn record_key_is_unsupported() {
        let mut handler = FsInputHandler::default();
        let err = handler
            .handle_input(&UnitKey::Record(1))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedKey { .. }));
    }
}
