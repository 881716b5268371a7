//! Markdown rendering of an analysis report, with an embedded Mermaid
//! flowchart of the dependency graph.

use crate::analysis::paths::DependencyGraph;
use crate::model::{ConflictSeverity, EdgeKind};
use crate::report::AnalysisReport;

/// Render the report as a Markdown document.
pub fn render(report: &AnalysisReport) -> String {
    let mut lines: Vec<String> = vec![
        "# FlagGuard Analysis Report".to_string(),
        String::new(),
        format!("**Generated:** {}", report.timestamp.to_rfc3339()),
        format!("**Config:** `{}`", report.config_file.display()),
        format!("**Source:** `{}`", report.source_path.display()),
        String::new(),
        "| Metric | Value |".to_string(),
        "|--------|-------|".to_string(),
        format!("| Flags analyzed | {} |", report.flags_analyzed),
        format!("| Files scanned | {} |", report.files_scanned),
        format!("| Conflicts | {} |", report.conflicts.len()),
        format!("| Dead code regions | {} |", report.dead_regions.len()),
        String::new(),
    ];

    if let Some(summary) = &report.executive_summary {
        lines.push("## Executive Summary".to_string());
        lines.push(String::new());
        lines.push(summary.clone());
        lines.push(String::new());
    }

    lines.push("## Conflicts".to_string());
    lines.push(String::new());
    if report.conflicts.is_empty() {
        lines.push("No conflicts detected.".to_string());
    } else {
        for conflict in &report.conflicts {
            lines.push(format!(
                "### {} {}: {}",
                severity_marker(conflict.severity),
                conflict.id,
                conflict.flags.join(", ")
            ));
            lines.push(format!("**Severity:** {}", conflict.severity.as_str()));
            lines.push(format!("**Reason:** {}", conflict.reason));
            if !conflict.affected_locations.is_empty() {
                lines.push(format!(
                    "**Affected:** {}",
                    conflict.affected_locations.join(", ")
                ));
            }
            lines.push(String::new());
        }
    }

    lines.push("## Dead Code".to_string());
    lines.push(String::new());
    if report.dead_regions.is_empty() {
        lines.push("No dead code detected.".to_string());
    } else {
        for region in &report.dead_regions {
            lines.push(format!(
                "### {}:{}-{}",
                region.file.display(),
                region.start_line,
                region.end_line
            ));
            lines.push(format!("**Reason:** {}", region.reason));
            if !region.snippet.is_empty() {
                lines.push(format!("```\n{}\n```", region.snippet));
            }
            lines.push(String::new());
        }
    }

    if !report.cycles.is_empty() {
        lines.push("## Dependency Cycles".to_string());
        lines.push(String::new());
        for cycle in &report.cycles {
            lines.push(format!("- {}", cycle.join(" -> ")));
        }
        lines.push(String::new());
    }

    lines.push("## Dependency Graph".to_string());
    lines.push(String::new());
    lines.push("```mermaid".to_string());
    lines.push(mermaid(&report.dependency_graph));
    lines.push("```".to_string());

    if !report.parse_issues.is_empty() || !report.scan_notes.is_empty() {
        lines.push(String::new());
        lines.push("## Diagnostics".to_string());
        lines.push(String::new());
        for issue in &report.parse_issues {
            lines.push(format!("- config: {issue}"));
        }
        for note in &report.scan_notes {
            lines.push(format!("- {}: {}", note.file.display(), note.message));
        }
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push("*Generated by FlagGuard*".to_string());
    lines.join("\n")
}

/// Mermaid `flowchart TD` rendering of the dependency graph. Enabled and
/// disabled flags get distinct node classes; edge style follows edge kind.
pub fn mermaid(graph: &DependencyGraph) -> String {
    let mut lines = vec!["flowchart TD".to_string()];
    for node in &graph.nodes {
        let class = if node.enabled { "enabled" } else { "disabled" };
        let id = node_id(&node.name);
        lines.push(format!("    {id}[{}]:::{class}", node.name));
    }
    for edge in &graph.edges {
        let source = node_id(&edge.source);
        let target = node_id(&edge.target);
        let rendered = match edge.kind {
            EdgeKind::Requires => format!("    {source} -->|requires| {target}"),
            EdgeKind::ConflictsWith => format!("    {source} -.->|conflicts| {target}"),
            EdgeKind::Implies => format!("    {source} -.->|often with| {target}"),
        };
        lines.push(rendered);
    }
    lines.push(String::new());
    lines.push("    classDef enabled fill:#90EE90,stroke:#228B22".to_string());
    lines.push("    classDef disabled fill:#FFB6C1,stroke:#DC143C".to_string());
    lines.join("\n")
}

/// Mermaid node identifiers cannot carry arbitrary punctuation.
fn node_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn severity_marker(severity: ConflictSeverity) -> &'static str {
    match severity {
        ConflictSeverity::Critical => "[critical]",
        ConflictSeverity::High => "[high]",
        ConflictSeverity::Medium => "[medium]",
        ConflictSeverity::Low => "[low]",
    }
}
