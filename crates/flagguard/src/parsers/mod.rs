//! Configuration parsers: dialect detection and normalization into the flag
//! model.
//!
//! A parser is a pure function from document text to a [`FlagSet`]. Three
//! dialects are supported: LaunchDarkly-style JSON exports, Unleash-style
//! YAML/JSON documents, and a generic JSON format. Detection is deterministic
//! and inspects the first non-whitespace content; on ambiguity the generic
//! dialect wins. Per-flag errors are recovered and reported as issues when
//! the root structure is well-formed; root-level failures abort the parse.

mod generic;
mod launchdarkly;
mod unleash;

use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::model::{FlagSet, FlagValidationError};

/// Configuration dialect tag. The set of dialects is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    LaunchDarkly,
    Unleash,
    Generic,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LaunchDarkly => "launchdarkly",
            Self::Unleash => "unleash",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "launchdarkly" => Ok(Self::LaunchDarkly),
            "unleash" => Ok(Self::Unleash),
            "generic" => Ok(Self::Generic),
            other => Err(format!("unknown dialect '{other}'")),
        }
    }
}

/// Errors raised while parsing a configuration document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("invalid YAML: {0}")]
    Yaml(String),
    #[error("expected an object or array at the document root")]
    ExpectedObjectOrArray,
    #[error("flag record is missing a 'name' or 'key' field")]
    MissingName,
    #[error("flag '{flag}': unknown flag kind '{alias}'")]
    UnknownFlagKind { flag: String, alias: String },
    #[error("flag '{flag}': default variation index {index} is out of bounds")]
    BadDefault { flag: String, index: usize },
    #[error(transparent)]
    Validation(#[from] FlagValidationError),
}

/// A recoverable per-flag problem. The offending flag is skipped or
/// normalized, never silently dropped from the diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseIssue {
    /// Flag identifier, when one could be determined.
    pub flag: Option<String>,
    pub error: ParseError,
}

/// Outcome of a successful parse: the normalized flag set, the dialect that
/// produced it, and any per-flag issues recovered along the way.
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    pub dialect: Dialect,
    pub flags: FlagSet,
    pub issues: Vec<ParseIssue>,
}

/// Detect the dialect of a configuration document.
///
/// A top-level `flags` object whose values carry `variations` arrays is a
/// LaunchDarkly-style export. A leading document separator or a top-level
/// `features` sequence is an Unleash-style document. Anything else, including
/// every ambiguous case, is the generic dialect.
pub fn detect_dialect(content: &str) -> Dialect {
    let trimmed = strip_bom(content).trim_start();
    if trimmed.starts_with("---") {
        return Dialect::Unleash;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(root) = value.as_object() {
            if let Some(flags) = root.get("flags").and_then(Value::as_object) {
                let has_variations = flags
                    .values()
                    .any(|f| f.get("variations").is_some_and(Value::is_array));
                if has_variations {
                    return Dialect::LaunchDarkly;
                }
            }
            if root.get("features").is_some_and(Value::is_array) {
                return Dialect::Unleash;
            }
        }
        return Dialect::Generic;
    }

    // Not JSON; an Unleash document is the only YAML dialect we accept.
    if let Ok(value) = serde_yaml::from_str::<Value>(trimmed) {
        if let Some(root) = value.as_object() {
            if root.get("features").is_some_and(Value::is_array) {
                return Dialect::Unleash;
            }
        }
    }
    Dialect::Generic
}

/// Parse a configuration document, auto-detecting the dialect.
pub fn parse_str(content: &str) -> Result<ParsedConfig, ParseError> {
    let dialect = detect_dialect(content);
    debug!(dialect = dialect.as_str(), "detected configuration dialect");
    parse_with_dialect(content, dialect)
}

/// Parse a configuration document with a known dialect.
pub fn parse_with_dialect(content: &str, dialect: Dialect) -> Result<ParsedConfig, ParseError> {
    let content = strip_bom(content);
    let (flags, issues) = match dialect {
        Dialect::LaunchDarkly => launchdarkly::parse(content)?,
        Dialect::Unleash => unleash::parse(content)?,
        Dialect::Generic => generic::parse(content)?,
    };
    let flags = FlagSet::new(flags)?;
    Ok(ParsedConfig {
        dialect,
        flags,
        issues,
    })
}

/// Read and parse a configuration file. Input is UTF-8; a leading byte-order
/// mark is tolerated.
pub fn parse_file(path: &Path) -> Result<ParsedConfig, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_str(&content)
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}
