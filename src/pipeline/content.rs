//! Content types flowing through the processing pipeline.
//!
//! [`ContentUnit`] is the unit of work: every processing step receives a
//! unit, mutates its body or annotations, and hands it back to the
//! controller.  Units are created exactly once by an input handler, carry
//! an immutable identity key, and are never duplicated mid-pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ── UnitKey ────────────────────────────────────────────────────────────

/// Stable identity of a content unit.
///
/// Assigned once at creation by the input handler that produced the unit
/// and never rewritten afterwards.  The key doubles as the input key the
/// handler enumerated: a source path for filesystem input, a record id
/// for database input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKey {
    /// Source file path (filesystem input).
    Path(PathBuf),
    /// Primary key of the backing record (database input).
    Record(i64),
}

impl UnitKey {
    /// Returns a short label for the key variant, for logging and metrics.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Record(_) => "record",
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Record(id) => write!(f, "record:{id}"),
        }
    }
}

// ── Annotation ─────────────────────────────────────────────────────────

/// A derived marker produced by a processing step.
///
/// Annotations accumulate on a unit as steps run: normalized text,
/// extracted statute references, an assigned court, a privacy flag.
/// Position fields are optional byte offsets into the unit's normalized
/// text for annotations that point at a span (references do, a court
/// assignment does not).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation kind, e.g. [`Annotation::REFERENCE`].
    pub kind: String,
    /// The annotation payload.
    pub value: String,
    /// Start offset of the annotated span, if positional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    /// End offset of the annotated span, if positional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

impl Annotation {
    /// Normalized plain-text rendering of the unit body.
    pub const TEXT: &'static str = "text";
    /// An extracted statute/case reference.
    pub const REFERENCE: &'static str = "reference";
    /// The court assigned to the unit.
    pub const COURT: &'static str = "court";
    /// Privacy flag (`"true"` / `"false"`).
    pub const PRIVATE: &'static str = "private";

    /// Create a non-positional annotation.
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            start: None,
            end: None,
        }
    }

    /// Create an annotation covering a span of the normalized text.
    #[must_use]
    pub fn spanned(
        kind: impl Into<String>,
        value: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            start: Some(start),
            end: Some(end),
        }
    }
}

// ── ContentUnit ────────────────────────────────────────────────────────

/// One document flowing through the pipeline.
///
/// Created by an input handler from one raw input key, mutated in place
/// by each selected processing step in sequence, consumed by
/// post-processing sinks, and discarded at the end of the run.  The
/// pipeline itself retains nothing across runs; persistence, if any, is
/// a side effect of a step or sink.
///
/// ```rust
/// use lexmill::pipeline::content::{Annotation, ContentUnit, UnitKey};
///
/// let mut unit = ContentUnit::new(UnitKey::Record(7), "BGH VI ZR 23/19", "<p>…</p>");
/// unit.annotations.push(Annotation::new(Annotation::COURT, "Bundesgerichtshof"));
/// assert!(unit.has_annotation(Annotation::COURT));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    key: UnitKey,
    /// Document title.
    pub title: String,
    /// Raw document body (typically HTML for legal-case sources).
    pub body: String,
    /// Derived markers produced by processing steps.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ContentUnit {
    /// Create a unit.  The key is fixed for the unit's lifetime.
    #[must_use]
    pub fn new(key: UnitKey, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
            body: body.into(),
            annotations: Vec::new(),
        }
    }

    /// The unit's identity key.
    #[must_use]
    pub fn key(&self) -> &UnitKey {
        &self.key
    }

    /// Whether any annotation of the given kind is present.
    #[must_use]
    pub fn has_annotation(&self, kind: &str) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }

    /// All annotations of the given kind, in insertion order.
    pub fn annotations_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.kind == kind)
    }

    /// The first annotation of the given kind, if any.
    #[must_use]
    pub fn first_annotation(&self, kind: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.kind == kind)
    }

    /// Plain-text surface of the unit: the normalized-text annotation when
    /// a normalization step has run, the raw body otherwise.
    #[must_use]
    pub fn text(&self) -> &str {
        self.first_annotation(Annotation::TEXT)
            .map_or(self.body.as_str(), |a| a.value.as_str())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
