//! JSON rendering of an analysis report.

use crate::report::AnalysisReport;

/// Render the report as pretty-printed JSON.
pub fn render(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::paths::DependencyGraph;
    use chrono::Utc;
    use std::path::PathBuf;

    #[test]
    fn renders_contract_fields() {
        let report = AnalysisReport {
            timestamp: Utc::now(),
            config_file: PathBuf::from("flags.json"),
            source_path: PathBuf::from("src"),
            flags_analyzed: 1,
            files_scanned: 2,
            conflicts: Vec::new(),
            dead_regions: Vec::new(),
            dependency_graph: DependencyGraph::default(),
            cycles: Vec::new(),
            parse_issues: Vec::new(),
            unresolved_dependencies: Vec::new(),
            scan_notes: Vec::new(),
            executive_summary: Some("all clear".to_string()),
        };
        let rendered = render(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["flags_analyzed"], 1);
        assert_eq!(value["files_scanned"], 2);
        assert!(value["conflicts"].as_array().unwrap().is_empty());
        assert!(value["dependency_graph"]["nodes"].as_array().unwrap().is_empty());
        assert_eq!(value["executive_summary"], "all clear");
    }
}
