//! Canonical in-memory representation of flags, check sites, and analysis
//! results.
//!
//! Everything here is created once per analysis run and never mutated after
//! construction; downstream phases consume these types as immutable inputs.

mod flag;
mod usage;

pub use flag::{Flag, FlagKind, FlagSet, FlagValidationError, TargetingRule, Variation};
pub use usage::{CheckKind, CheckSite, CheckSiteSet, ScanNote, ScanNoteKind};

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Severity of a detected conflict, used to prioritize remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ConflictSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// An impossible partial assignment of flag values.
///
/// The severity is a pure function of the value vector: critical when every
/// flag in the assignment is required true, medium when every flag is
/// required false, high otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Stable identifier for this run, e.g. `C1A2B3C`.
    pub id: String,
    /// Flag names involved, in deterministic order.
    pub flags: Vec<String>,
    /// The specific boolean values proving impossibility.
    pub values: BTreeMap<String, bool>,
    pub severity: ConflictSeverity,
    /// Technical explanation derived from the assignment.
    pub reason: String,
    /// `file:line` locations made unreachable by this conflict.
    pub affected_locations: Vec<String>,
}

/// A source range whose required partial assignment is unsatisfiable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadRegion {
    pub file: PathBuf,
    /// First line of the dead range, 1-indexed.
    pub start_line: u32,
    /// Last line of the dead range, 1-indexed.
    pub end_line: u32,
    /// The partial assignment that witnesses unreachability.
    pub required: BTreeMap<String, bool>,
    pub reason: String,
    pub snippet: String,
}

impl DeadRegion {
    /// Number of source lines covered by this region.
    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// Kind of relationship between two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Requires,
    ConflictsWith,
    Implies,
}

/// Whether an edge came from configuration or was inferred from code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    Explicit,
    Inferred,
}

/// A directed dependency relationship between two flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub origin: EdgeOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_strings_round_trip() {
        for sev in [
            ConflictSeverity::Critical,
            ConflictSeverity::High,
            ConflictSeverity::Medium,
            ConflictSeverity::Low,
        ] {
            let json = serde_json::to_string(&sev).unwrap();
            assert_eq!(json, format!("\"{}\"", sev.as_str()));
        }
    }

    #[test]
    fn dead_region_line_count_is_inclusive() {
        let region = DeadRegion {
            file: PathBuf::from("app.py"),
            start_line: 10,
            end_line: 10,
            required: BTreeMap::new(),
            reason: String::new(),
            snippet: String::new(),
        };
        assert_eq!(region.line_count(), 1);
    }
}
