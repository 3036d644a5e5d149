//! Built-in processing steps for legal-case content.
//!
//! Every step here is idempotent: it checks for its own annotation kind
//! before producing output, so re-running a pipeline over already
//! processed content changes nothing.

pub mod assign_court;
pub mod extract_refs;
pub mod normalize;
pub mod set_private;

pub use assign_court::AssignCourt;
pub use extract_refs::ExtractRefs;
pub use normalize::Normalize;
pub use set_private::SetPrivate;

use crate::pipeline::registry::RegistryBuilder;
use std::sync::Arc;

/// Register every built-in case step under its canonical name.
///
/// The names registered here are the ones the default configuration's
/// step table refers to.
#[must_use]
pub fn register_case_steps(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .register("normalize", || Arc::new(Normalize::new()))
        .register("assign_court", || Arc::new(AssignCourt::with_default_courts()))
        .register("extract_refs", || Arc::new(ExtractRefs::new()))
        .register("set_private_true", || Arc::new(SetPrivate::new(true)))
        .register("set_private_false", || Arc::new(SetPrivate::new(false)))
}
