//! HTML-to-text normalization step.
//!
//! Legal-case bodies arrive as HTML from scraper imports.  This step
//! strips the markup, collapses whitespace runs, and records the result
//! as the unit's normalized-text annotation so downstream steps and the
//! search index work on clean plain text.

use crate::pipeline::content::{Annotation, ContentUnit};
use crate::pipeline::step::{ProcessingStep, StepError};
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const STEP_ID: &str = "normalize";

/// Extracts plain text from the unit body and attaches it as a
/// [`Annotation::TEXT`] annotation.
///
/// Idempotent: a unit that already carries a normalized-text annotation
/// is left untouched.
pub struct Normalize {
    whitespace: Regex,
    normalized: AtomicUsize,
    skipped: AtomicUsize,
}

impl Normalize {
    /// Create the step.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Single spaces stay; only runs of two or more collapse.
            whitespace: Regex::new(r"\s\s+").unwrap_or_else(|_| unreachable!("literal pattern")),
            normalized: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        }
    }

    fn html_to_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let raw: String = document
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ");
        self.whitespace.replace_all(&raw, " ").trim().to_owned()
    }
}

impl Default for Normalize {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessingStep for Normalize {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn process(&self, unit: &mut ContentUnit) -> Result<(), StepError> {
        if unit.has_annotation(Annotation::TEXT) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let text = self.html_to_text(&unit.body);
        unit.annotations.push(Annotation::new(Annotation::TEXT, text));
        self.normalized.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn log_stats(&self) {
        info!(
            target: "lexmill::steps",
            "normalize: {} normalized, {} already normalized",
            self.normalized.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
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
    async fn strips_markup_and_collapses_whitespace() {
        let step = Normalize::new();
        let mut u = unit("<p>Das   Urteil</p>\n\n<p>vom <b>12.</b> Mai</p>");

        step.process(&mut u).await.unwrap();
        assert_eq!(u.text(), "Das Urteil vom 12. Mai");
        // Raw body is preserved.
        assert!(u.body.contains("<p>"));
    }

    #[tokio::test]
    async fn is_idempotent() {
        let step = Normalize::new();
        let mut u = unit("<p>einmal</p>");

        step.process(&mut u).await.unwrap();
        step.process(&mut u).await.unwrap();

        let texts: Vec<_> = u.annotations_of(Annotation::TEXT).collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(step.skipped.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn plain_text_body_passes_through() {
        let step = Normalize::new();
        let mut u = unit("schon  Text");
        step.process(&mut u).await.unwrap();
        assert_eq!(u.text(), "schon Text");
    }
}
