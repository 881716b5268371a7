//! The immutable report object assembled at the end of an analysis run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::paths::DependencyGraph;
use crate::analysis::theory::UnresolvedDependency;
use crate::model::{Conflict, ConflictSeverity, DeadRegion, ScanNote};

/// Everything a reporter needs to render one analysis run.
///
/// The timestamp is an ISO-8601 UTC instant; all other fields are derived
/// deterministically from the inputs (identifiers excepted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub timestamp: DateTime<Utc>,
    pub config_file: PathBuf,
    pub source_path: PathBuf,
    pub flags_analyzed: usize,
    pub files_scanned: usize,
    pub conflicts: Vec<Conflict>,
    pub dead_regions: Vec<DeadRegion>,
    pub dependency_graph: DependencyGraph,
    /// Dependency cycles surfaced for human review.
    pub cycles: Vec<Vec<String>>,
    /// Per-flag parse problems recovered during configuration parsing.
    pub parse_issues: Vec<String>,
    /// Dependency references with no matching declaration.
    pub unresolved_dependencies: Vec<UnresolvedDependency>,
    /// Per-file scan diagnostics.
    pub scan_notes: Vec<ScanNote>,
    /// Free-text summary. Generated from the result counts by default; an
    /// external explainer collaborator may replace it.
    pub executive_summary: Option<String>,
}

impl AnalysisReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn conflicts_with_severity(&self, severity: ConflictSeverity) -> usize {
        self.conflicts
            .iter()
            .filter(|c| c.severity == severity)
            .count()
    }

    /// Plain-text summary built from the result counts.
    pub fn default_summary(&self) -> String {
        if self.conflicts.is_empty() && self.dead_regions.is_empty() {
            return format!(
                "Analyzed {} flags across {} files. No conflicts or dead code detected.",
                self.flags_analyzed, self.files_scanned
            );
        }
        let critical = self.conflicts_with_severity(ConflictSeverity::Critical);
        let dead_lines: u32 = self.dead_regions.iter().map(DeadRegion::line_count).sum();
        format!(
            "Analyzed {} flags across {} files. Found {} conflicts ({} critical) and {} dead code regions covering {} lines.",
            self.flags_analyzed,
            self.files_scanned,
            self.conflicts.len(),
            critical,
            self.dead_regions.len(),
            dead_lines
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn empty_report() -> AnalysisReport {
        AnalysisReport {
            timestamp: Utc::now(),
            config_file: PathBuf::from("flags.json"),
            source_path: PathBuf::from("src"),
            flags_analyzed: 2,
            files_scanned: 3,
            conflicts: Vec::new(),
            dead_regions: Vec::new(),
            dependency_graph: DependencyGraph::default(),
            cycles: Vec::new(),
            parse_issues: Vec::new(),
            unresolved_dependencies: Vec::new(),
            scan_notes: Vec::new(),
            executive_summary: None,
        }
    }

    #[test]
    fn clean_summary_mentions_counts() {
        let report = empty_report();
        let summary = report.default_summary();
        assert!(summary.contains("2 flags"));
        assert!(summary.contains("3 files"));
        assert!(summary.contains("No conflicts"));
    }

    #[test]
    fn summary_counts_critical_conflicts_and_dead_lines() {
        let mut report = empty_report();
        report.conflicts.push(Conflict {
            id: "C000001".to_string(),
            flags: vec!["a".to_string()],
            values: BTreeMap::from([("a".to_string(), true)]),
            severity: ConflictSeverity::Critical,
            reason: String::new(),
            affected_locations: Vec::new(),
        });
        report.dead_regions.push(DeadRegion {
            file: PathBuf::from("app.py"),
            start_line: 3,
            end_line: 7,
            required: BTreeMap::new(),
            reason: String::new(),
            snippet: String::new(),
        });
        let summary = report.default_summary();
        assert!(summary.contains("1 conflicts (1 critical)"));
        assert!(summary.contains("5 lines"));
        assert!(report.has_conflicts());
    }

    #[test]
    fn timestamp_serializes_as_rfc3339_utc() {
        let report = empty_report();
        let json = serde_json::to_value(&report).unwrap();
        let stamp = json["timestamp"].as_str().unwrap();
        assert!(stamp.ends_with('Z') || stamp.contains("+00:00"));
    }
}
