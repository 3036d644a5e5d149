//! Statute-reference extraction step.
//!
//! Scans the unit's normalized text for German statute citations
//! (`§ 433 Abs. 2 BGB`, `§§ 823, …`) and records each hit as a spanned
//! [`Annotation::REFERENCE`] annotation with byte offsets into the text
//! it was found in.

use crate::pipeline::content::{Annotation, ContentUnit};
use crate::pipeline::step::{ProcessingStep, StepError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const STEP_ID: &str = "extract_refs";

/// Citation shape: section sign(s), section number with optional letter
/// suffix, optional Absatz/Satz qualifiers, then the statute book
/// abbreviation (capitalized, e.g. BGB, StGB, ZPO).
const REFERENCE_PATTERN: &str =
    r"§§?\s*\d+[a-z]?(?:\s+Abs\.\s*\d+)?(?:\s+Satz\s*\d+)?\s+[A-ZÄÖÜ][A-Za-zÄÖÜäöüß]*";

/// Finds statute references in the unit text.
///
/// Idempotent: a unit that already carries reference annotations is left
/// untouched rather than double-annotated.
pub struct ExtractRefs {
    pattern: Regex,
    refs_found: AtomicUsize,
}

impl ExtractRefs {
    /// Create the step with the default citation pattern.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(REFERENCE_PATTERN)
                .unwrap_or_else(|_| unreachable!("literal pattern")),
            refs_found: AtomicUsize::new(0),
        }
    }
}

impl Default for ExtractRefs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessingStep for ExtractRefs {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn process(&self, unit: &mut ContentUnit) -> Result<(), StepError> {
        if unit.has_annotation(Annotation::REFERENCE) {
            return Ok(());
        }

        let mut found = Vec::new();
        for m in self.pattern.find_iter(unit.text()) {
            found.push(Annotation::spanned(
                Annotation::REFERENCE,
                m.as_str(),
                m.start(),
                m.end(),
            ));
        }

        self.refs_found.fetch_add(found.len(), Ordering::Relaxed);
        unit.annotations.extend(found);
        Ok(())
    }

    fn log_stats(&self) {
        info!(
            target: "lexmill::steps",
            "extract_refs: {} references found",
            self.refs_found.load(Ordering::Relaxed),
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::content::UnitKey;

    fn unit(body: &str) -> ContentUnit {
        ContentUnit::new(UnitKey::Record(1), "t", body)
    }

    #[tokio::test]
    async fn finds_references_with_offsets() {
        let step = ExtractRefs::new();
        let mut u = unit("Anspruch aus § 433 Abs. 2 BGB sowie § 280 BGB.");

        step.process(&mut u).await.unwrap();
        let refs: Vec<_> = u.annotations_of(Annotation::REFERENCE).collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].value, "§ 433 Abs. 2 BGB");
        assert_eq!(
            &u.text()[refs[0].start.unwrap()..refs[0].end.unwrap()],
            "§ 433 Abs. 2 BGB"
        );
        assert_eq!(refs[1].value, "§ 280 BGB");
    }

    #[tokio::test]
    async fn prefers_normalized_text_over_raw_body() {
        let step = ExtractRefs::new();
        let mut u = unit("<p>§ 1 BGB</p>");
        u.annotations.push(Annotation::new(Annotation::TEXT, "§ 1 BGB gilt."));

        step.process(&mut u).await.unwrap();
        let refs: Vec<_> = u.annotations_of(Annotation::REFERENCE).collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, Some(0));
    }

    #[tokio::test]
    async fn no_references_is_not_an_error() {
        let step = ExtractRefs::new();
        let mut u = unit("keine Zitate hier");
        step.process(&mut u).await.unwrap();
        assert!(!u.has_annotation(Annotation::REFERENCE));
    }

    #[tokio::test]
    async fn is_idempotent() {
        let step = ExtractRefs::new();
        let mut u = unit("§ 823 BGB");
        step.process(&mut u).await.unwrap();
        step.process(&mut u).await.unwrap();
        assert_eq!(u.annotations_of(Annotation::REFERENCE).count(), 1);
    }
}
