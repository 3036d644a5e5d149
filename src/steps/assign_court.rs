//! Court-assignment step.
//!
//! Matches a known court name against the unit title first (case
//! metadata usually names the court there), then against the normalized
//! text, and records the first hit as a [`Annotation::COURT`]
//! annotation.

use crate::pipeline::content::{Annotation, ContentUnit};
use crate::pipeline::step::{ProcessingStep, StepError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const STEP_ID: &str = "assign_court";

/// Federal and state court names, most specific first so that e.g.
/// "Oberlandesgericht" wins over its "Landgericht" substring.
const DEFAULT_COURTS: &[&str] = &[
    "Bundesverfassungsgericht",
    "Bundesverwaltungsgericht",
    "Bundesarbeitsgericht",
    "Bundessozialgericht",
    "Bundesgerichtshof",
    "Bundesfinanzhof",
    "Oberverwaltungsgericht",
    "Oberlandesgericht",
    "Verwaltungsgericht",
    "Landesarbeitsgericht",
    "Landessozialgericht",
    "Arbeitsgericht",
    "Sozialgericht",
    "Finanzgericht",
    "Landgericht",
    "Amtsgericht",
];

/// Assigns a court to each unit by name matching.
///
/// Idempotent: a unit that already carries a court annotation is left
/// untouched.  A unit naming no known court gets a recorded per-unit
/// failure, not an aborted run.
pub struct AssignCourt {
    courts: Vec<String>,
    fallback: Option<String>,
    assigned: AtomicUsize,
    unmatched: AtomicUsize,
}

impl AssignCourt {
    /// Create the step with a custom court list; earlier entries win when
    /// several names occur.
    #[must_use]
    pub fn new<I, S>(courts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            courts: courts.into_iter().map(Into::into).collect(),
            fallback: None,
            assigned: AtomicUsize::new(0),
            unmatched: AtomicUsize::new(0),
        }
    }

    /// Create the step with the built-in German court list.
    #[must_use]
    pub fn with_default_courts() -> Self {
        Self::new(DEFAULT_COURTS.iter().copied())
    }

    /// Assign this court when no known name matches, instead of failing
    /// the unit.
    #[must_use]
    pub fn or_default(mut self, court: impl Into<String>) -> Self {
        self.fallback = Some(court.into());
        self
    }

    fn find_court(&self, unit: &ContentUnit) -> Option<&str> {
        self.courts
            .iter()
            .find(|c| unit.title.contains(c.as_str()))
            .or_else(|| {
                let text = unit.text();
                self.courts.iter().find(|c| text.contains(c.as_str()))
            })
            .map(String::as_str)
    }
}

#[async_trait]
impl ProcessingStep for AssignCourt {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn process(&self, unit: &mut ContentUnit) -> Result<(), StepError> {
        if unit.has_annotation(Annotation::COURT) {
            return Ok(());
        }

        let court = match self.find_court(unit) {
            Some(court) => court.to_owned(),
            None => match &self.fallback {
                Some(fallback) => fallback.clone(),
                None => {
                    self.unmatched.fetch_add(1, Ordering::Relaxed);
                    return Err(StepError::MissingInput {
                        step: STEP_ID.to_owned(),
                        what: "recognizable court name in title or text".to_owned(),
                    });
                }
            },
        };

        unit.annotations
            .push(Annotation::new(Annotation::COURT, court));
        self.assigned.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn log_stats(&self) {
        info!(
            target: "lexmill::steps",
            "assign_court: {} assigned, {} unmatched",
            self.assigned.load(Ordering::Relaxed),
            self.unmatched.load(Ordering::Relaxed),
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
