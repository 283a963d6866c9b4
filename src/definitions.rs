//! Flag definitions and the validated set they are evaluated from.

use serde::{Deserialize, Serialize};
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::ConfigError;

const MAX_FLAG_NAME_LEN: usize = 64;

/// Configuration of a single flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDefinition {
    /// Unique key within a [`FlagSet`]
    pub name: String,

    /// Value served when no override, allowlist or rollout rule decides
    #[serde(default)]
    pub base_enabled: bool,

    /// Share of callers (0-100) admitted by stable hash bucketing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout_percentage: Option<u8>,

    /// Exclusive gate; an empty set means no allowlist
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed_users: BTreeSet<String>,

    /// Forced values per deployment environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment_overrides: BTreeMap<String, bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FlagDefinition {
    /// Create a flag with only a base value.
    ///
    /// ```
    /// use flag_evaluator::FlagDefinition;
    ///
    /// let flag = FlagDefinition::new("new-ui", false)
    ///     .with_rollout(50)
    ///     .with_environment_override("staging", true);
    /// assert_eq!(flag.rollout_percentage, Some(50));
    /// ```
    pub fn new(name: impl Into<String>, base_enabled: bool) -> Self {
        Self {
            name: name.into(),
            base_enabled,
            rollout_percentage: None,
            allowed_users: BTreeSet::new(),
            environment_overrides: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_rollout(mut self, percentage: u8) -> Self {
        self.rollout_percentage = Some(percentage);
        self
    }

    pub fn allow_user(mut self, caller_id: impl Into<String>) -> Self {
        self.allowed_users.insert(caller_id.into());
        self
    }

    pub fn with_allowed_users<I, S>(mut self, caller_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_users
            .extend(caller_ids.into_iter().map(Into::into));
        self
    }

    pub fn with_environment_override(mut self, environment: impl Into<String>, enabled: bool) -> Self {
        self.environment_overrides.insert(environment.into(), enabled);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the definition in isolation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_flag_name(&self.name).map_err(|reason| ConfigError::InvalidName {
            name: self.name.clone(),
            reason,
        })?;

        if let Some(percentage) = self.rollout_percentage {
            if !validate_rollout_percentage(percentage) {
                return Err(ConfigError::RolloutOutOfRange {
                    name: self.name.clone(),
                    percentage,
                });
            }
        }

        Ok(())
    }
}

// Validating the flag name
fn validate_flag_name(name: &str) -> Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("flag name cannot be empty".to_string());
    };

    if name.len() > MAX_FLAG_NAME_LEN {
        return Err(format!(
            "flag name is too long (max: {MAX_FLAG_NAME_LEN} characters)"
        ));
    }

    if !first.is_ascii_alphabetic() {
        return Err("flag name must start with a letter".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(
            "flag name may only contain lowercase letters, digits, underscores and hyphens"
                .to_string(),
        );
    }

    Ok(())
}

pub(crate) fn validate_rollout_percentage(percentage: u8) -> bool {
    percentage <= 100
}

#[derive(Deserialize)]
struct FlagDocument {
    flags: Vec<FlagDefinition>,
}

/// A validated collection of flag definitions keyed by name.
///
/// Iteration is in name order, so evaluating a set twice visits flags in the
/// same sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    flags: BTreeMap<String, FlagDefinition>,
}

impl FlagSet {
    /// Validate and index definitions.
    ///
    /// Rejects malformed names, out-of-range rollout percentages and
    /// duplicate names.
    pub fn new<I>(definitions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = FlagDefinition>,
    {
        let mut flags = BTreeMap::new();

        for definition in definitions {
            definition.validate()?;

            match flags.entry(definition.name.clone()) {
                btree_map::Entry::Occupied(entry) => {
                    return Err(ConfigError::DuplicateFlag(entry.key().clone()));
                }
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(definition);
                }
            }
        }

        Ok(Self { flags })
    }

    /// Parse a `{"flags": [...]}` document.
    ///
    /// ```
    /// use flag_evaluator::FlagSet;
    ///
    /// let flags = FlagSet::from_json_str(r#"{
    ///     "flags": [{ "name": "new-ui", "base_enabled": true }]
    /// }"#).unwrap();
    /// assert!(flags.get("new-ui").is_some());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let document: FlagDocument = serde_json::from_str(json)?;
        Self::new(document.flags)
    }

    /// Read and parse a definitions file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&json)
    }

    pub fn get(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.flags.values()
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a FlagDefinition;
    type IntoIter = btree_map::Values<'a, String, FlagDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.values()
    }
}
