//! Path and dependency analysis.
//!
//! Check sites sharing a file and enclosing function are aggregated into a
//! code path treated as a conjunction of flag requirements. This is a
//! conservative over-approximation: sibling branches merge into one path,
//! which can only produce false positives against the SAT core, never false
//! negatives of reachability. On top of the paths sits the flag dependency
//! graph with explicit `requires` edges and inferred `implies` edges.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{CheckSiteSet, DependencyEdge, EdgeKind, EdgeOrigin, FlagKind, FlagSet};

/// Two flags co-occurring in at least this many code paths earn an inferred
/// `implies` edge. Changing it is a deliberate sensitivity decision.
pub const CO_OCCURRENCE_THRESHOLD: usize = 3;

/// A block of code that executes under a specific conjunction of flag
/// requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePath {
    pub file: PathBuf,
    pub function: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    /// Flag name to required value for every site in the group.
    pub required: BTreeMap<String, bool>,
}

impl CodePath {
    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    pub enabled: bool,
    pub kind: FlagKind,
}

/// Language-neutral node/edge list of the flag dependency graph, suitable for
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    /// Simple-cycle signals in the graph: sorted member lists of every
    /// non-trivial strongly connected component plus self-loops. Reported,
    /// never raised.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut indices = BTreeMap::new();
        for node in &self.nodes {
            indices.insert(node.name.as_str(), graph.add_node(node.name.as_str()));
        }
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (
                indices.get(edge.source.as_str()),
                indices.get(edge.target.as_str()),
            ) {
                graph.add_edge(a, b, ());
            }
        }
        let mut cycles = Vec::new();
        for component in tarjan_scc(&graph) {
            let is_cycle = component.len() > 1
                || (component.len() == 1 && graph.contains_edge(component[0], component[0]));
            if is_cycle {
                let mut members: Vec<String> =
                    component.iter().map(|&i| graph[i].to_string()).collect();
                members.sort();
                cycles.push(members);
            }
        }
        cycles.sort();
        cycles
    }
}

/// Result of one path analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathAnalysis {
    pub paths: Vec<CodePath>,
    pub graph: DependencyGraph,
}

/// Groups check sites into paths and builds the dependency graph.
pub struct PathAnalyzer<'a> {
    flags: &'a FlagSet,
    sites: &'a CheckSiteSet,
}

impl<'a> PathAnalyzer<'a> {
    pub fn new(flags: &'a FlagSet, sites: &'a CheckSiteSet) -> Self {
        Self { flags, sites }
    }

    pub fn analyze(&self) -> PathAnalysis {
        let paths = self.build_paths();
        let edges = self.build_edges(&paths);
        let graph = DependencyGraph {
            nodes: self.build_nodes(),
            edges,
        };
        info!(
            paths = paths.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "path analysis complete"
        );
        PathAnalysis { paths, graph }
    }

    /// Which flags gate code in `file`?
    pub fn flags_affecting_file(&self, file: &Path) -> BTreeSet<String> {
        self.sites
            .sites
            .iter()
            .filter(|s| s.file == file)
            .map(|s| s.flag_name.clone())
            .collect()
    }

    /// Which files check `flag`?
    pub fn files_affected_by_flag(&self, flag: &str) -> BTreeSet<PathBuf> {
        self.sites
            .sites
            .iter()
            .filter(|s| s.flag_name == flag)
            .map(|s| s.file.clone())
            .collect()
    }

    fn build_paths(&self) -> Vec<CodePath> {
        let mut groups: BTreeMap<(PathBuf, Option<String>), Vec<usize>> = BTreeMap::new();
        for (i, site) in self.sites.sites.iter().enumerate() {
            groups
                .entry((site.file.clone(), site.function.clone()))
                .or_default()
                .push(i);
        }

        groups
            .into_iter()
            .map(|((file, function), members)| {
                let mut required = BTreeMap::new();
                let mut start_line = u32::MAX;
                let mut end_line = 0u32;
                for &i in &members {
                    let site = &self.sites.sites[i];
                    required.insert(site.flag_name.clone(), !site.negated);
                    start_line = start_line.min(site.start_line);
                    end_line = end_line.max(site.end_line.max(site.start_line));
                }
                CodePath {
                    file,
                    function,
                    start_line,
                    end_line,
                    required,
                }
            })
            .collect()
    }

    fn build_nodes(&self) -> Vec<GraphNode> {
        let mut nodes: Vec<GraphNode> = self
            .flags
            .iter()
            .map(|flag| GraphNode {
                name: flag.name.clone(),
                enabled: flag.enabled,
                kind: flag.kind,
            })
            .collect();
        // Undeclared dependency targets are admitted as free nodes.
        let declared: BTreeSet<&str> = self.flags.iter().map(|f| f.name.as_str()).collect();
        let mut extra: BTreeSet<&str> = BTreeSet::new();
        for flag in self.flags.iter() {
            for dep in &flag.dependencies {
                if !declared.contains(dep.as_str()) {
                    extra.insert(dep);
                }
            }
        }
        nodes.extend(extra.into_iter().map(|name| GraphNode {
            name: name.to_string(),
            enabled: true,
            kind: FlagKind::Boolean,
        }));
        nodes
    }

    fn build_edges(&self, paths: &[CodePath]) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        for flag in self.flags.iter() {
            for dep in &flag.dependencies {
                edges.push(DependencyEdge {
                    source: flag.name.clone(),
                    target: dep.clone(),
                    kind: EdgeKind::Requires,
                    origin: EdgeOrigin::Explicit,
                });
            }
        }

        let mut co_occurrence: BTreeMap<(String, String), usize> = BTreeMap::new();
        for path in paths {
            let flags: Vec<&String> = path.required.keys().collect();
            for i in 0..flags.len() {
                for j in (i + 1)..flags.len() {
                    let (a, b) = if flags[i] <= flags[j] {
                        (flags[i], flags[j])
                    } else {
                        (flags[j], flags[i])
                    };
                    *co_occurrence.entry((a.clone(), b.clone())).or_default() += 1;
                }
            }
        }
        for ((a, b), count) in co_occurrence {
            if count >= CO_OCCURRENCE_THRESHOLD {
                edges.push(DependencyEdge {
                    source: a,
                    target: b,
                    kind: EdgeKind::Implies,
                    origin: EdgeOrigin::Inferred,
                });
            }
        }
        edges
    }
}
