//! Flag definitions as normalized from the configuration dialects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value kind a flag can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Boolean,
    String,
    Number,
    Json,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Number => "number",
            Self::Json => "json",
        }
    }

    /// Resolve a dialect type alias. Accepts the generic-dialect alias set.
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "boolean" | "bool" => Some(Self::Boolean),
            "string" | "str" => Some(Self::String),
            "number" | "int" | "float" => Some(Self::Number),
            "json" | "object" => Some(Self::Json),
            _ => None,
        }
    }
}

/// One of the possible values a flag can serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub description: String,
}

impl Variation {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            description: String::new(),
        }
    }
}

/// An ordered rule mapping evaluation context to a chosen variation.
///
/// Conditions are carried as opaque records; the analysis never interprets
/// them (satisfiability is computed over the enabled-bit abstraction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingRule {
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Value>,
    pub variation: String,
    /// Percentage of matching contexts served this variation, in [0, 100].
    pub rollout_percentage: f64,
}

/// A complete feature flag definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// Unique flag key.
    pub name: String,
    pub kind: FlagKind,
    /// Global kill switch. A disabled flag is always-off for every query.
    pub enabled: bool,
    /// Name of the variation served when no rule matches. Empty means
    /// unspecified; if non-empty it must refer to an existing variation.
    #[serde(default)]
    pub default_variation: String,
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default)]
    pub targeting_rules: Vec<TargetingRule>,
    /// Names of flags that must be active for this flag to be active.
    /// Forward references are allowed; resolution happens at encoding time.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Flag {
    /// A minimal boolean flag with on/off variations, used by tests and the
    /// generic dialect's defaults.
    pub fn boolean(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            kind: FlagKind::Boolean,
            enabled,
            default_variation: "on".to_string(),
            variations: vec![
                Variation::new("on", Value::Bool(true)),
                Variation::new("off", Value::Bool(false)),
            ],
            targeting_rules: Vec::new(),
            dependencies: Vec::new(),
            description: String::new(),
            tags: Vec::new(),
        }
    }

    /// Check the per-flag invariants: non-empty name and, when set, a default
    /// variation that resolves to a declared variation.
    pub fn validate(&self) -> Result<(), FlagValidationError> {
        if self.name.is_empty() {
            return Err(FlagValidationError::EmptyName);
        }
        if !self.default_variation.is_empty()
            && !self
                .variations
                .iter()
                .any(|v| v.name == self.default_variation)
        {
            return Err(FlagValidationError::BadDefault {
                flag: self.name.clone(),
                default_variation: self.default_variation.clone(),
            });
        }
        Ok(())
    }

    /// Serialize to the neutral tree structure consumed by reporters.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "type": self.kind.as_str(),
            "enabled": self.enabled,
            "default_variation": self.default_variation,
            "variations": self.variations,
            "targeting_rules": self.targeting_rules,
            "dependencies": self.dependencies,
            "description": self.description,
            "tags": self.tags,
        })
    }
}

/// Violation of a flag-model invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagValidationError {
    #[error("flag name cannot be empty")]
    EmptyName,
    #[error("duplicate flag name '{0}'")]
    DuplicateName(String),
    #[error("flag '{flag}': default variation '{default_variation}' not found")]
    BadDefault {
        flag: String,
        default_variation: String,
    },
}

/// An ordered, validated collection of flags.
///
/// Construction enforces the collection invariants (unique names, per-flag
/// validity); the set is immutable afterwards. Reporters consume the neutral
/// tree from [`FlagSet::to_value`] rather than this type directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSet {
    flags: Vec<Flag>,
    index: BTreeMap<String, usize>,
}

impl FlagSet {
    pub fn new(flags: Vec<Flag>) -> Result<Self, FlagValidationError> {
        let mut index = BTreeMap::new();
        for (i, flag) in flags.iter().enumerate() {
            flag.validate()?;
            if index.insert(flag.name.clone(), i).is_some() {
                return Err(FlagValidationError::DuplicateName(flag.name.clone()));
            }
        }
        Ok(Self { flags, index })
    }

    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.index.get(name).map(|&i| &self.flags[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Every name referenced anywhere in the set: declared flags plus
    /// dependency targets, declared names first, in declaration order.
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flags.iter().map(|f| f.name.clone()).collect();
        for flag in &self.flags {
            for dep in &flag.dependencies {
                if !self.index.contains_key(dep) && !names.contains(dep) {
                    names.push(dep.clone());
                }
            }
        }
        names
    }

    /// Serialize to the neutral tree structure consumed by reporters.
    pub fn to_value(&self) -> Value {
        Value::Array(self.flags.iter().map(Flag::to_value).collect())
    }
}
