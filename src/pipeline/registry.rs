//! The [`StepRegistry`] maps step names to step implementations per
//! content kind.
//!
//! The mapping is a startup-time registration table: code registers a
//! factory for every step name it ships, configuration picks an ordered
//! subset per content kind, and [`RegistryBuilder::build`] validates that
//! every configured name has a factory, independent of which steps a
//! given run later selects.
//!
//! The registry is effectively immutable after build and is shared across
//! controller instances via `Arc`; it is never reloaded or hot-swapped
//! within a process.

use super::step::ProcessingStep;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Factory producing a fresh step instance for one content kind.
pub type StepFactory = Box<dyn Fn() -> Arc<dyn ProcessingStep> + Send + Sync>;

// ── RegistryError ──────────────────────────────────────────────────────

/// Errors raised while building or querying the registry.
///
/// These are configuration errors: fatal, raised synchronously during
/// setup, before any input is read.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A configured step name has no registered implementation.
    #[error("no step implementation registered for '{name}' (content kind '{kind}')")]
    UnknownStepPackage {
        /// Content kind whose configuration referenced the name.
        kind: String,
        /// The unresolvable step name.
        name: String,
    },

    /// The requested content kind has no configured step list.
    #[error("no processing steps configured for content kind '{kind}'")]
    UnknownKind {
        /// The unresolvable content kind.
        kind: String,
    },
}

// ── KindSteps ──────────────────────────────────────────────────────────

/// The resolved step set for one content kind, in configuration order.
pub struct KindSteps {
    steps: Vec<(String, Arc<dyn ProcessingStep>)>,
}

impl KindSteps {
    /// Look up one step by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ProcessingStep>> {
        self.steps
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, step)| step)
    }

    /// All steps in configuration order, with their names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ProcessingStep>)> {
        self.steps.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Configured step names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(n, _)| n.as_str())
    }

    /// Number of configured steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the kind has no configured steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ── StepRegistry ───────────────────────────────────────────────────────

/// Immutable mapping from content kind to its resolved, ordered step set.
///
/// Built once via [`StepRegistry::builder`], then shared read-only.
pub struct StepRegistry {
    kinds: HashMap<String, KindSteps>,
}

impl StepRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve the step set for a content kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownKind`] if the kind was never
    /// configured.
    pub fn resolve(&self, kind: &str) -> Result<&KindSteps, RegistryError> {
        self.kinds.get(kind).ok_or_else(|| RegistryError::UnknownKind {
            kind: kind.to_owned(),
        })
    }

    /// Content kinds with a configured step set.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

// ── RegistryBuilder ────────────────────────────────────────────────────

/// Builder collecting step factories, finalized against a configuration
/// table with [`build`](Self::build).
#[derive(Default)]
pub struct RegistryBuilder {
    factories: HashMap<String, StepFactory>,
}

impl RegistryBuilder {
    /// Register a factory under a step name.
    ///
    /// Names are unique within the builder; registering the same name
    /// twice replaces the earlier factory.
    #[must_use]
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn ProcessingStep> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Finalize the registry against a `content kind -> ordered step
    /// names` table.
    ///
    /// Every configured name is resolved eagerly, so a typo in the table
    /// fails here, at startup, rather than when a run first selects the
    /// step.  Each kind gets its own step instances.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStepPackage`] for the first
    /// configured name without a factory.
    pub fn build(
        self,
        table: &HashMap<String, Vec<String>>,
    ) -> Result<StepRegistry, RegistryError> {
        let mut kinds = HashMap::with_capacity(table.len());

        for (kind, names) in table {
            let mut steps = Vec::with_capacity(names.len());
            for name in names {
                let factory = self.factories.get(name).ok_or_else(|| {
                    RegistryError::UnknownStepPackage {
                        kind: kind.clone(),
                        name: name.clone(),
                    }
                })?;
                steps.push((name.clone(), factory()));
            }
            kinds.insert(kind.clone(), KindSteps { steps });
        }

        Ok(StepRegistry { kinds })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::content::ContentUnit;
    use crate::pipeline::step::StepError;
    use async_trait::async_trait;

    struct Noop(&'static str);

    #[async_trait]
    impl ProcessingStep for Noop {
        fn id(&self) -> &str {
            self.0
        }
        async fn process(&self, _unit: &mut ContentUnit) -> Result<(), StepError> {
            Ok(())
        }
    }

    fn table(kind: &str, names: &[&str]) -> HashMap<String, Vec<String>> {
        let mut t = HashMap::new();
        t.insert(
            kind.to_owned(),
            names.iter().map(|s| (*s).to_owned()).collect(),
        );
        t
    }

    #[test]
    fn resolves_steps_in_config_order() {
        let registry = StepRegistry::builder()
            .register("b", || Arc::new(Noop("b")))
            .register("a", || Arc::new(Noop("a")))
            .build(&table("case", &["b", "a"]))
            .unwrap();

        let steps = registry.resolve("case").unwrap();
        let names: Vec<_> = steps.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(steps.get("a").is_some());
        assert!(steps.get("missing").is_none());
    }

    #[test]
    fn unconfigured_kind_fails() {
        let registry = StepRegistry::builder()
            .register("a", || Arc::new(Noop("a")))
            .build(&table("case", &["a"]))
            .unwrap();

        assert!(matches!(
            registry.resolve("law"),
            Err(RegistryError::UnknownKind { .. })
        ));
    }

    #[test]
    fn configured_name_without_factory_fails_at_build() {
        let result = StepRegistry::builder()
            .register("a", || Arc::new(Noop("a")))
            .build(&table("case", &["a", "nonexistent"]));

        let err = result.err().expect("build should fail");
        match err {
            RegistryError::UnknownStepPackage { kind, name } => {
                assert_eq!(kind, "case");
                assert_eq!(name, "nonexistent");
            }
            other => panic!("expected UnknownStepPackage, got {other:?}"),
        }
    }

    #[test]
    fn each_kind_gets_its_own_instances() {
        let mut t = table("case", &["a"]);
        t.insert("law".to_owned(), vec!["a".to_owned()]);

        let registry = StepRegistry::builder()
            .register("a", || Arc::new(Noop("a")))
            .build(&t)
            .unwrap();

        let case_step = registry.resolve("case").unwrap().get("a").unwrap().clone();
        let law_step = registry.resolve("law").unwrap().get("a").unwrap().clone();
        assert!(!Arc::ptr_eq(&case_step, &law_step));
    }
}
