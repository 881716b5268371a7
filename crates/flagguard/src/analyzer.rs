//! Analysis orchestrator: runs the pipeline phases in order and assembles
//! the report.
//!
//! Phases are sequential with no shared mutable state: parse configuration,
//! scan source, encode the theory, detect conflicts, classify dead code,
//! analyze paths. Each phase's output is immutable input to the next.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::analysis::conflicts::{attach_locations, ConflictDetector};
use crate::analysis::dead_code::DeadCodeFinder;
use crate::analysis::paths::PathAnalyzer;
use crate::analysis::theory::{ConstraintEncoder, EncodeOptions, DEFAULT_CONFLICT_ARITY};
use crate::model::DeadRegion;
use crate::parsers::{self, Dialect, ParseError};
use crate::report::AnalysisReport;
use crate::scanner::{ExtractionMode, ScannerOptions, SourceScanner};

/// Options for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Force a configuration dialect instead of auto-detecting.
    pub dialect: Option<Dialect>,
    /// Mutually exclusive flag groups supplied by the caller.
    pub exclusive_groups: Vec<Vec<String>>,
    /// Flags asserted always-on.
    pub required_flags: Vec<String>,
    /// Extra directory names pruned during the scan.
    pub extra_excludes: Vec<String>,
    pub max_files: Option<usize>,
    pub extraction_mode: ExtractionMode,
    /// Bound on flags combined per impossible-state check.
    pub conflict_arity: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            dialect: None,
            exclusive_groups: Vec::new(),
            required_flags: Vec::new(),
            extra_excludes: Vec::new(),
            max_files: None,
            extraction_mode: ExtractionMode::Ast,
            conflict_arity: DEFAULT_CONFLICT_ARITY,
        }
    }
}

/// The analysis pipeline entry point.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    /// Run the full pipeline. Only root-level configuration failures abort;
    /// everything else is recovered per item and surfaced in the report.
    pub fn analyze(&self, config_path: &Path, source_root: &Path) -> Result<AnalysisReport, ParseError> {
        info!(
            config = %config_path.display(),
            source = %source_root.display(),
            "starting analysis"
        );

        let parsed = match self.options.dialect {
            Some(dialect) => {
                let content =
                    std::fs::read_to_string(config_path).map_err(|e| ParseError::Io {
                        path: config_path.display().to_string(),
                        message: e.to_string(),
                    })?;
                parsers::parse_with_dialect(&content, dialect)?
            }
            None => parsers::parse_file(config_path)?,
        };
        info!(
            flags = parsed.flags.len(),
            dialect = parsed.dialect.as_str(),
            issues = parsed.issues.len(),
            "configuration parsed"
        );

        let scanner = SourceScanner::new(ScannerOptions {
            extra_excludes: self.options.extra_excludes.clone(),
            max_files: self.options.max_files,
            mode: self.options.extraction_mode,
        });
        let sites = scanner.scan(source_root);

        let encoder = ConstraintEncoder::new(EncodeOptions {
            exclusive_groups: self.options.exclusive_groups.clone(),
            required_flags: self.options.required_flags.clone(),
        });
        let theory = encoder.encode(&parsed.flags);

        let detector = ConflictDetector::with_arity(&theory, self.options.conflict_arity);
        let mut conflicts = detector.detect_all();
        attach_locations(&mut conflicts, &sites);

        let finder = DeadCodeFinder::new(&theory);
        let mut dead_regions = finder.find(&sites);

        let path_analysis = PathAnalyzer::new(&parsed.flags, &sites).analyze();
        // Composite paths can be dead even when each site alone is
        // reachable; single-site paths were already classified above.
        let composite: Vec<DeadRegion> = path_analysis
            .paths
            .iter()
            .filter(|p| p.required.len() > 1)
            .filter_map(|p| finder.check_path(&p.required, &p.file, p.start_line, p.end_line))
            .collect();
        dead_regions.extend(composite);

        let mut report = AnalysisReport {
            timestamp: Utc::now(),
            config_file: config_path.to_path_buf(),
            source_path: source_root.to_path_buf(),
            flags_analyzed: parsed.flags.len(),
            files_scanned: sites.files_scanned,
            conflicts,
            dead_regions,
            cycles: path_analysis.graph.cycles(),
            dependency_graph: path_analysis.graph,
            parse_issues: parsed
                .issues
                .iter()
                .map(|issue| match &issue.flag {
                    Some(flag) => format!("{flag}: {}", issue.error),
                    None => issue.error.to_string(),
                })
                .collect(),
            unresolved_dependencies: theory.unresolved,
            scan_notes: sites.notes.clone(),
            executive_summary: None,
        };
        report.executive_summary = Some(report.default_summary());

        info!(
            conflicts = report.conflicts.len(),
            dead_regions = report.dead_regions.len(),
            "analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn healthy_run_produces_clean_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(
            dir.path(),
            "flags.json",
            r#"{"flags": [{"name": "a", "enabled": true}, {"name": "b", "enabled": true}]}"#,
        );
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let report = Analyzer::default().analyze(&config, &src).unwrap();
        assert_eq!(report.flags_analyzed, 2);
        assert_eq!(report.files_scanned, 0);
        assert!(report.conflicts.is_empty());
        assert!(report.dead_regions.is_empty());
        assert_eq!(report.dependency_graph.nodes.len(), 2);
        assert!(report.dependency_graph.edges.is_empty());
        assert!(report.executive_summary.as_deref().unwrap().contains("No conflicts"));
    }

    #[test]
    fn root_parse_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "flags.json", "{{{not json");
        let err = Analyzer::default()
            .analyze(&config, dir.path())
            .unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn missing_config_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let err = Analyzer::default()
            .analyze(&dir.path().join("absent.json"), dir.path())
            .unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn disabled_flag_behind_check_yields_dead_region() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(
            dir.path(),
            "flags.json",
            r#"{"flags": [{"name": "f", "enabled": false}]}"#,
        );
        let src = dir.path().join("src");
        write(&src, "app.py", "if is_enabled(\"f\"):\n    run()\n");

        let report = Analyzer::default().analyze(&config, &src).unwrap();
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.dead_regions.len(), 1);
        assert!(report.dead_regions[0].reason.contains("always disabled"));
    }
}
