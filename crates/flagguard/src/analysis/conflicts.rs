//! Conflict detection: enumerating impossible flag-value combinations.

use std::collections::BTreeMap;

use tracing::info;
use uuid::Uuid;

use crate::analysis::theory::{EncodedTheory, DEFAULT_CONFLICT_ARITY};
use crate::model::{CheckSiteSet, Conflict, ConflictSeverity};

/// Detects impossible flag states in an encoded theory.
pub struct ConflictDetector<'a> {
    theory: &'a EncodedTheory,
    arity: usize,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(theory: &'a EncodedTheory) -> Self {
        Self::with_arity(theory, DEFAULT_CONFLICT_ARITY)
    }

    /// Use a custom bound on the number of flags combined per check.
    pub fn with_arity(theory: &'a EncodedTheory, arity: usize) -> Self {
        Self { theory, arity }
    }

    /// Enumerate the subset-minimal conflicts in the theory at the
    /// configured arity.
    ///
    /// The resulting set is a deterministic function of the theory; only the
    /// minted identifiers are fresh per run.
    pub fn detect_all(&self) -> Vec<Conflict> {
        let vars: Vec<String> = self.theory.session.names().to_vec();
        let impossible = self.theory.session.enumerate_impossible(&vars, self.arity);
        let conflicts: Vec<Conflict> = impossible.into_iter().map(mint_conflict).collect();
        info!(count = conflicts.len(), "conflict detection complete");
        conflicts
    }

    /// Return the conflict describing `state` iff that assignment is
    /// unsatisfiable.
    pub fn check_state(&self, state: &BTreeMap<String, bool>) -> Option<Conflict> {
        if self.theory.session.is_satisfiable(state) {
            None
        } else {
            Some(mint_conflict(state.clone()))
        }
    }
}

/// Attach `file:line` locations of check sites that gate on a conflicting
/// value of any involved flag.
pub fn attach_locations(conflicts: &mut [Conflict], sites: &CheckSiteSet) {
    for conflict in conflicts.iter_mut() {
        let mut locations: Vec<String> = sites
            .sites
            .iter()
            .filter(|site| {
                conflict
                    .values
                    .get(&site.flag_name)
                    .is_some_and(|&required| required == !site.negated)
            })
            .map(|site| site.location())
            .collect();
        locations.sort();
        locations.dedup();
        conflict.affected_locations = locations;
    }
}

fn mint_conflict(values: BTreeMap<String, bool>) -> Conflict {
    let flags: Vec<String> = values.keys().cloned().collect();
    let severity = severity_of(&values);
    let reason = reason_for(&values);
    Conflict {
        id: conflict_id(),
        flags,
        values,
        severity,
        reason,
        affected_locations: Vec::new(),
    }
}

/// Severity is a pure function of the value vector: all-true means someone is
/// trying to enable conflicting features; all-false is a contradiction among
/// always-off constraints.
fn severity_of(values: &BTreeMap<String, bool>) -> ConflictSeverity {
    if values.values().all(|&v| v) {
        ConflictSeverity::Critical
    } else if values.values().any(|&v| v) {
        ConflictSeverity::High
    } else {
        ConflictSeverity::Medium
    }
}

fn reason_for(values: &BTreeMap<String, bool>) -> String {
    let on: Vec<&str> = values
        .iter()
        .filter(|(_, &v)| v)
        .map(|(k, _)| k.as_str())
        .collect();
    let off: Vec<&str> = values
        .iter()
        .filter(|(_, &v)| !v)
        .map(|(k, _)| k.as_str())
        .collect();
    if !on.is_empty() && !off.is_empty() {
        format!(
            "Enabling {} requires {} to be enabled",
            on.join(", "),
            off.join(", ")
        )
    } else {
        let all: Vec<&str> = values.keys().map(String::as_str).collect();
        format!("Flags {} cannot be in this state together", all.join(", "))
    }
}

fn conflict_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("C{}", hex[..6].to_uppercase())
}
