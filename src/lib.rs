//! Feature-flag evaluation core.
//!
//! Decides whether a named flag is enabled for a caller and which variant of
//! a multivariate experiment the caller sees. Every query is a pure function
//! of the flag set and the [`EvaluationContext`] passed in.
//!
//! ```
//! use flag_evaluator::*;
//!
//! let flags = FlagSet::new(vec![
//!     FlagDefinition::new("new-ui", false)
//!         .with_rollout(50)
//!         .with_environment_override("staging", true),
//!     FlagDefinition::new("checkout", true),
//! ]).unwrap();
//!
//! let context = EvaluationContext::new()
//!     .with_caller_id("u1")
//!     .with_environment("staging");
//! assert!(is_enabled(&flags, "new-ui", &context));
//!
//! let variants = Variants::new().with("control", "blue").with("treatment", "green");
//! let color = select_variant(&flags, "checkout", &variants, "blue", &context);
//! assert!(color == "blue" || color == "green");
//! ```

pub mod definitions;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod hash;
pub mod variant;

pub use definitions::{FlagDefinition, FlagSet};
pub use diagnostics::{Diagnostic, DiagnosticSink, NoopSink, RecordingSink, TracingSink};
pub use error::ConfigError;
pub use evaluation::{
    evaluate_all, is_enabled, resolve, resolve_with_reason, select_variant, EvaluationContext,
    Evaluator, Resolution, ResolutionReason, ResolvedFlag,
};
pub use hash::stable_hash;
pub use variant::{DefaultReason, Variant, VariantAssignment, Variants};
