use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::definitions::{validate_rollout_percentage, FlagDefinition, FlagSet};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::hash::rollout_bucket;
use crate::variant::{self, DefaultReason, VariantAssignment, Variants};

// Caller context for evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }
}

/// Which rule decided a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionReason {
    EnvironmentOverride,
    AllowlistMember,
    NotInAllowlist,
    OutsideRollout { bucket: u32, percentage: u8 },
    RolloutOutOfRange { percentage: u8 },
    Base,
    UnknownFlag,
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvironmentOverride => f.write_str("Environment override applied"),
            Self::AllowlistMember => f.write_str("Caller is on the allowlist"),
            Self::NotInAllowlist => f.write_str("Caller is not on the allowlist"),
            Self::OutsideRollout { bucket, percentage } => {
                write!(f, "Caller bucket {} not in {}% rollout", bucket, percentage)
            }
            Self::RolloutOutOfRange { percentage } => {
                write!(f, "Rollout percentage {} is out of range", percentage)
            }
            Self::Base => f.write_str("Base value, no specific rules applied"),
            Self::UnknownFlag => f.write_str("Flag is not configured"),
        }
    }
}

// Flag evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub enabled: bool,
    pub reason: ResolutionReason,
}

impl Resolution {
    fn new(enabled: bool, reason: ResolutionReason) -> Self {
        Self { enabled, reason }
    }
}

/// Decision for one flag, with its definition carried along unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedFlag<'a> {
    pub name: &'a str,
    pub enabled: bool,
    pub reason: ResolutionReason,
    pub definition: &'a FlagDefinition,
}

/// Decide whether a flag is enabled for a caller.
pub fn resolve(definition: &FlagDefinition, context: &EvaluationContext) -> bool {
    resolve_with_reason(definition, context).enabled
}

/// Decide whether a flag is enabled for a caller, and why.
///
/// Rules are tried in order and the first that applies wins:
/// environment override, allowlist, percentage rollout, base value.
/// Allowlist and rollout need a caller id and are skipped without one.
pub fn resolve_with_reason(definition: &FlagDefinition, context: &EvaluationContext) -> Resolution {
    // Step 1: Environment override beats every other rule
    if let Some(forced) = context
        .environment()
        .and_then(|env| definition.environment_overrides.get(env))
    {
        return Resolution::new(*forced, ResolutionReason::EnvironmentOverride);
    }

    let base = Resolution::new(definition.base_enabled, ResolutionReason::Base);

    let Some(caller_id) = context.caller_id() else {
        return base;
    };

    // Step 2: A non-empty allowlist admits members only
    if !definition.allowed_users.is_empty() {
        return if definition.allowed_users.contains(caller_id) {
            Resolution::new(definition.base_enabled, ResolutionReason::AllowlistMember)
        } else {
            Resolution::new(false, ResolutionReason::NotInAllowlist)
        };
    }

    // Step 3: Percentage rollout can only exclude
    if let Some(percentage) = definition.rollout_percentage {
        if !validate_rollout_percentage(percentage) {
            return Resolution::new(false, ResolutionReason::RolloutOutOfRange { percentage });
        }

        let bucket = rollout_bucket(caller_id);
        if bucket >= u32::from(percentage) {
            return Resolution::new(false, ResolutionReason::OutsideRollout { bucket, percentage });
        }
    }

    // Step 4: Base value
    base
}

/// Queries over one flag set, reporting fallbacks to a diagnostic sink.
///
/// ```
/// use flag_evaluator::{EvaluationContext, Evaluator, FlagDefinition, FlagSet};
///
/// let flags = FlagSet::new(vec![
///     FlagDefinition::new("new-ui", false).with_environment_override("staging", true),
/// ]).unwrap();
/// let context = EvaluationContext::new()
///     .with_caller_id("u1")
///     .with_environment("staging");
///
/// assert!(Evaluator::new(&flags).is_enabled("new-ui", &context));
/// ```
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    flags: &'a FlagSet,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> Evaluator<'a> {
    /// Evaluator that reports diagnostics through `tracing`.
    pub fn new(flags: &'a FlagSet) -> Self {
        Self {
            flags,
            sink: &TracingSink,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn flags(&self) -> &'a FlagSet {
        self.flags
    }

    /// Resolve every flag in the set.
    pub fn evaluate_all(&self, context: &EvaluationContext) -> BTreeMap<&'a str, ResolvedFlag<'a>> {
        self.flags
            .iter()
            .map(|definition| {
                let resolution = self.resolve(definition, context);
                let resolved = ResolvedFlag {
                    name: &definition.name,
                    enabled: resolution.enabled,
                    reason: resolution.reason,
                    definition,
                };
                (definition.name.as_str(), resolved)
            })
            .collect()
    }

    /// Resolve one flag by name. Unknown names resolve to disabled.
    pub fn explain(&self, name: &str, context: &EvaluationContext) -> Resolution {
        match self.lookup(name) {
            Some(definition) => self.resolve(definition, context),
            None => Resolution::new(false, ResolutionReason::UnknownFlag),
        }
    }

    pub fn is_enabled(&self, name: &str, context: &EvaluationContext) -> bool {
        self.explain(name, context).enabled
    }

    /// Resolve a flag, then assign the caller a variant if it is enabled.
    pub fn assign_variant<'v, T>(
        &self,
        name: &str,
        variants: &'v Variants<T>,
        context: &EvaluationContext,
    ) -> VariantAssignment<'v, T> {
        let Some(definition) = self.lookup(name) else {
            return VariantAssignment::Default(DefaultReason::UnknownFlag);
        };

        let enabled = self.resolve(definition, context).enabled;
        let assignment = variant::assign(definition, enabled, variants, context);

        if matches!(assignment, VariantAssignment::Default(DefaultReason::EmptyTable)) {
            self.sink.report(Diagnostic::EmptyVariantTable {
                name: name.to_string(),
            });
        }

        assignment
    }

    pub fn select_variant<T: Clone>(
        &self,
        name: &str,
        variants: &Variants<T>,
        default_value: T,
        context: &EvaluationContext,
    ) -> T {
        self.assign_variant(name, variants, context)
            .value_or(default_value)
    }

    fn lookup(&self, name: &str) -> Option<&'a FlagDefinition> {
        let definition = self.flags.get(name);
        if definition.is_none() {
            self.sink.report(Diagnostic::UnknownFlag {
                name: name.to_string(),
            });
        }
        definition
    }

    fn resolve(&self, definition: &FlagDefinition, context: &EvaluationContext) -> Resolution {
        let resolution = resolve_with_reason(definition, context);
        if let ResolutionReason::RolloutOutOfRange { percentage } = resolution.reason {
            self.sink.report(Diagnostic::RolloutOutOfRange {
                name: definition.name.clone(),
                percentage,
            });
        }
        resolution
    }
}

impl fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("flags", &self.flags.len())
            .finish_non_exhaustive()
    }
}

/// Resolve every flag in `definitions` for `context`.
pub fn evaluate_all<'a>(
    definitions: &'a FlagSet,
    context: &EvaluationContext,
) -> BTreeMap<&'a str, ResolvedFlag<'a>> {
    Evaluator::new(definitions).evaluate_all(context)
}

/// Whether `name` is enabled for `context`; `false` for unknown flags.
pub fn is_enabled(definitions: &FlagSet, name: &str, context: &EvaluationContext) -> bool {
    Evaluator::new(definitions).is_enabled(name, context)
}

/// Value of `name`'s variant table the caller should see, or `default_value`.
pub fn select_variant<T: Clone>(
    definitions: &FlagSet,
    name: &str,
    variants: &Variants<T>,
    default_value: T,
    context: &EvaluationContext,
) -> T {
    Evaluator::new(definitions).select_variant(name, variants, default_value, context)
}
