//! Multivariate (A/B/n) variant selection.

use serde::{Deserialize, Serialize};

use crate::definitions::FlagDefinition;
use crate::evaluation::EvaluationContext;
use crate::hash::stable_hash;

/// Token used in the bucketing key when the context has no caller id.
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// One labeled option of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant<T> {
    pub label: String,
    pub value: T,
}

/// Ordered variant table.
///
/// The registration order decides which bucket maps to which label, so two
/// hosts that register the same labels in the same order assign callers
/// identically.
#[derive(Debug, Clone, PartialEq)]
pub struct Variants<T> {
    entries: Vec<Variant<T>>,
}

impl<T> Variants<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a variant, builder style.
    ///
    /// ```
    /// use flag_evaluator::Variants;
    ///
    /// let variants = Variants::new()
    ///     .with("control", "blue")
    ///     .with("treatment", "green");
    /// assert_eq!(variants.labels().collect::<Vec<_>>(), vec!["control", "treatment"]);
    /// ```
    pub fn with(mut self, label: impl Into<String>, value: T) -> Self {
        self.insert(label, value);
        self
    }

    /// Register a variant. Re-registering a label replaces its value and
    /// keeps its original position.
    pub fn insert(&mut self, label: impl Into<String>, value: T) {
        let label = label.into();
        match self.entries.iter_mut().find(|v| v.label == label) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Variant { label, value }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|v| v.label == label)
            .map(|v| &v.value)
    }

    pub fn at(&self, index: usize) -> Option<&Variant<T>> {
        self.entries.get(index)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|v| v.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Variants<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Into<String>> FromIterator<(S, T)> for Variants<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut variants = Self::new();
        for (label, value) in iter {
            variants.insert(label, value);
        }
        variants
    }
}

/// Why a variant query served the default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultReason {
    Disabled,
    UnknownFlag,
    EmptyTable,
}

/// Outcome of a variant query.
#[derive(Debug, PartialEq)]
pub enum VariantAssignment<'v, T> {
    Assigned {
        index: usize,
        label: &'v str,
        value: &'v T,
    },
    Default(DefaultReason),
}

impl<'v, T> VariantAssignment<'v, T> {
    pub fn label(&self) -> Option<&'v str> {
        match self {
            Self::Assigned { label, .. } => Some(*label),
            Self::Default(_) => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }

    /// Assigned value, or `default` when none was assigned.
    pub fn value_or(&self, default: T) -> T
    where
        T: Clone,
    {
        match self {
            Self::Assigned { value, .. } => (*value).clone(),
            Self::Default(_) => default,
        }
    }
}

/// Key hashed to pick a variant: flag name joined with the live caller.
pub fn bucketing_key(flag_name: &str, context: &EvaluationContext) -> String {
    let caller = context.caller_id().unwrap_or(ANONYMOUS_CALLER);
    format!("{}:{}", flag_name, caller)
}

/// Position in a table of `len` variants for this flag and caller.
///
/// Returns `None` for an empty table.
pub fn variant_index(flag_name: &str, context: &EvaluationContext, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let hash = u64::from(stable_hash(&bucketing_key(flag_name, context)));
    Some((hash % len as u64) as usize)
}

/// Assign a variant for an already resolved flag.
pub fn assign<'v, T>(
    definition: &FlagDefinition,
    resolved_enabled: bool,
    variants: &'v Variants<T>,
    context: &EvaluationContext,
) -> VariantAssignment<'v, T> {
    if !resolved_enabled {
        return VariantAssignment::Default(DefaultReason::Disabled);
    }

    variant_index(&definition.name, context, variants.len())
        .and_then(|index| variants.at(index).map(|v| (index, v)))
        .map_or(
            VariantAssignment::Default(DefaultReason::EmptyTable),
            |(index, variant)| VariantAssignment::Assigned {
                index,
                label: &variant.label,
                value: &variant.value,
            },
        )
}

/// Pick the value the caller should see, or `default_value` when the flag
/// is off or the table is empty.
pub fn select_variant<T: Clone>(
    definition: &FlagDefinition,
    resolved_enabled: bool,
    variants: &Variants<T>,
    default_value: T,
    context: &EvaluationContext,
) -> T {
    assign(definition, resolved_enabled, variants, context).value_or(default_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_way() -> Variants<&'static str> {
        Variants::new()
            .with("control", "blue")
            .with("green", "green")
            .with("red", "red")
    }

    #[test]
    fn test_disabled_serves_default() {
        let flag = FlagDefinition::new("checkout", true);
        let context = EvaluationContext::new().with_caller_id("alice");

        let value = select_variant(&flag, false, &three_way(), "fallback", &context);
        assert_eq!(value, "fallback");
        assert_eq!(
            assign(&flag, false, &three_way(), &context),
            VariantAssignment::Default(DefaultReason::Disabled)
        );
    }

    #[test]
    fn test_known_assignments() {
        let flag = FlagDefinition::new("checkout", true);
        let variants = three_way();

        let alice = EvaluationContext::new().with_caller_id("alice");
        let bob = EvaluationContext::new().with_caller_id("bob");

        // stable_hash("checkout:alice") % 3 == 1, stable_hash("checkout:bob") % 3 == 2
        assert_eq!(select_variant(&flag, true, &variants, "none", &alice), "green");
        assert_eq!(select_variant(&flag, true, &variants, "none", &bob), "red");
    }

    #[test]
    fn test_anonymous_caller_uses_fixed_token() {
        let flag = FlagDefinition::new("checkout", true);
        let context = EvaluationContext::new();

        assert_eq!(bucketing_key("checkout", &context), "checkout:anonymous");
        assert_eq!(assign(&flag, true, &three_way(), &context).label(), Some("control"));
    }

    #[test]
    fn test_same_caller_is_stable() {
        let flag = FlagDefinition::new("checkout", true);
        let variants = three_way();
        let context = EvaluationContext::new().with_caller_id("carol");

        let first = assign(&flag, true, &variants, &context).label();
        for _ in 0..50 {
            assert_eq!(assign(&flag, true, &variants, &context).label(), first);
        }
    }

    #[test]
    fn test_distinct_callers_spread_across_variants() {
        let flag = FlagDefinition::new("checkout", true);
        let variants = three_way();

        let mut counts = [0usize; 3];
        for i in 0..3_000 {
            let context = EvaluationContext::new().with_caller_id(format!("user-{i}"));
            if let VariantAssignment::Assigned { index, .. } = assign(&flag, true, &variants, &context) {
                counts[index] += 1;
            }
        }

        for count in counts {
            assert!((900..=1_100).contains(&count), "counts: {counts:?}");
        }
    }

    #[test]
    fn test_empty_table_serves_default() {
        let flag = FlagDefinition::new("checkout", true);
        let context = EvaluationContext::new().with_caller_id("alice");
        let variants: Variants<i32> = Variants::new();

        assert_eq!(select_variant(&flag, true, &variants, 7, &context), 7);
        assert_eq!(
            assign(&flag, true, &variants, &context),
            VariantAssignment::Default(DefaultReason::EmptyTable)
        );
    }

    #[test]
    fn test_relabel_keeps_position() {
        let variants = Variants::new()
            .with("a", 1)
            .with("b", 2)
            .with("a", 10);

        assert_eq!(variants.len(), 2);
        assert_eq!(variants.labels().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(variants.get("a"), Some(&10));
    }

    #[test]
    fn test_order_decides_label() {
        let flag = FlagDefinition::new("checkout", true);
        let context = EvaluationContext::new().with_caller_id("alice");

        let forward: Variants<&str> = [("x", "x"), ("y", "y")].into_iter().collect();
        let reversed: Variants<&str> = [("y", "y"), ("x", "x")].into_iter().collect();

        // stable_hash("checkout:alice") is even, so bucket 0 either way
        assert_eq!(variant_index("checkout", &context, 2), Some(0));
        assert_eq!(assign(&flag, true, &forward, &context).label(), Some("x"));
        assert_eq!(assign(&flag, true, &reversed, &context).label(), Some("y"));
    }
}
