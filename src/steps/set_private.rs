//! Privacy-flag step.
//!
//! Marks every unit public or private via a [`Annotation::PRIVATE`]
//! annotation.  The same type backs both configured step names
//! (`set_private_true` / `set_private_false`); an existing flag with a
//! different value is rewritten in place rather than duplicated.

use crate::pipeline::content::{Annotation, ContentUnit};
use crate::pipeline::step::{ProcessingStep, StepError};
use async_trait::async_trait;

/// Sets the unit's privacy flag to a fixed value.
pub struct SetPrivate {
    value: bool,
    id: &'static str,
}

impl SetPrivate {
    /// Create the step for the given flag value.
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self {
            value,
            id: if value { "set_private_true" } else { "set_private_false" },
        }
    }

    fn value_str(&self) -> &'static str {
        if self.value {
            "true"
        } else {
            "false"
        }
    }
}

#[async_trait]
impl ProcessingStep for SetPrivate {
    fn id(&self) -> &str {
        self.id
    }

    async fn process(&self, unit: &mut ContentUnit) -> Result<(), StepError> {
        let value = self.value_str();
        if let Some(existing) = unit
            .annotations
            .iter_mut()
            .find(|a| a.kind == Annotation::PRIVATE)
        {
            existing.value = value.to_owned();
        } else {
            unit.annotations
                .push(Annotation::new(Annotation::PRIVATE, value));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
