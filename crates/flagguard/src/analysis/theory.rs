//! Constraint encoder: lowers a flag set into the propositional theory.
//!
//! One boolean variable per referenced flag name (declared, or referenced as
//! a dependency target). Clauses: `¬v` for every disabled flag, an
//! implication per declared dependency, pairwise exclusions for
//! caller-supplied exclusion groups, and a positive unit per required flag.
//! A dependency on an undeclared name is reported and admitted as a free
//! variable, never silently dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::sat::{SatBackend, SatSession};
use crate::model::FlagSet;

/// Default bound on the number of flags combined per impossible-state check.
pub const DEFAULT_CONFLICT_ARITY: usize = 2;

/// Caller-supplied constraints beyond the flag set itself.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Groups of mutually exclusive flags: no two members of a group may be
    /// active together.
    pub exclusive_groups: Vec<Vec<String>>,
    /// Flags asserted always-on.
    pub required_flags: Vec<String>,
}

/// A dependency reference with no matching declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDependency {
    pub flag: String,
    pub dependency: String,
}

/// The encoded theory: the query session plus encoding diagnostics.
pub struct EncodedTheory {
    pub session: SatSession,
    pub unresolved: Vec<UnresolvedDependency>,
    /// Declared-dependency cycles found at encode time. Non-fatal: the
    /// implication ring is satisfiable (it collapses to an equivalence
    /// class); cycles are surfaced for human review.
    pub cycles: Vec<Vec<String>>,
}

/// Lowers flag sets into [`EncodedTheory`] values.
#[derive(Debug, Clone, Default)]
pub struct ConstraintEncoder {
    options: EncodeOptions,
}

impl ConstraintEncoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    /// Encode with the default solver backend.
    pub fn encode(&self, flags: &FlagSet) -> EncodedTheory {
        self.encode_with_session(flags, SatSession::with_default_backend())
    }

    /// Encode into a session owning the given backend.
    pub fn encode_with_backend(&self, flags: &FlagSet, backend: Box<dyn SatBackend>) -> EncodedTheory {
        self.encode_with_session(flags, SatSession::new(backend))
    }

    fn encode_with_session(&self, flags: &FlagSet, mut session: SatSession) -> EncodedTheory {
        for name in flags.referenced_names() {
            session.intern(&name);
        }

        let mut unresolved = Vec::new();
        for flag in flags.iter() {
            if !flag.enabled {
                session.assert_always_off(&flag.name);
            }
            for dependency in &flag.dependencies {
                session.assert_requires(&flag.name, dependency);
                if !flags.contains(dependency) {
                    warn!(
                        flag = %flag.name,
                        dependency = %dependency,
                        "dependency has no declaration, admitting as free variable"
                    );
                    unresolved.push(UnresolvedDependency {
                        flag: flag.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        for group in &self.options.exclusive_groups {
            for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    session.assert_conflicts(&group[i], &group[j]);
                }
            }
        }
        for name in &self.options.required_flags {
            session.assert_always_on(name);
        }

        let cycles = dependency_cycles(flags);
        for cycle in &cycles {
            warn!(cycle = %cycle.join(" -> "), "cyclic flag dependency");
        }

        debug!(
            vars = session.names().len(),
            clauses = session.clause_count(),
            backend = session.backend_name(),
            "theory encoded"
        );
        EncodedTheory {
            session,
            unresolved,
            cycles,
        }
    }
}

/// Cycles in the declared-dependency relation, as sorted member lists of the
/// non-trivial strongly connected components (plus self-dependencies).
fn dependency_cycles(flags: &FlagSet) -> Vec<Vec<String>> {
    use petgraph::algo::tarjan_scc;
    use petgraph::graph::DiGraph;

    let mut graph = DiGraph::<&str, ()>::new();
    let mut indices = std::collections::BTreeMap::new();
    for flag in flags.iter() {
        indices.insert(flag.name.as_str(), graph.add_node(flag.name.as_str()));
    }
    for flag in flags.iter() {
        for dep in &flag.dependencies {
            if let (Some(&a), Some(&b)) =
                (indices.get(flag.name.as_str()), indices.get(dep.as_str()))
            {
                graph.add_edge(a, b, ());
            }
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
