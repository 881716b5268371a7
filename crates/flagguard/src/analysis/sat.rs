//! SAT core: variable interning, permanent clauses, and satisfiability
//! queries over partial assignments.
//!
//! The decision procedure itself sits behind [`SatBackend`]. The default
//! backend wraps splr, a pure-Rust CDCL solver. The [`SolverUnavailable`]
//! sentinel is a legitimate backend, not an error: with it every query
//! answers satisfiable and enumeration is empty, so the rest of the pipeline
//! degrades gracefully instead of crashing.

use std::collections::BTreeMap;

use tracing::{debug, warn};

/// Outcome of one decision-procedure run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Satisfiable,
    Unsatisfiable,
    /// The backend could not decide; treated conservatively as satisfiable.
    Unknown,
}

/// A sound and complete propositional decision procedure over CNF clause
/// lists. Literals follow the DIMACS convention: variable ids start at 1 and
/// a negative literal negates its variable.
pub trait SatBackend {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    fn solve(&self, cnf: &[Vec<i32>]) -> SolveOutcome;
}

/// The splr-backed decision procedure.
#[derive(Debug, Default)]
pub struct SplrBackend;

impl SatBackend for SplrBackend {
    fn name(&self) -> &'static str {
        "splr"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, cnf: &[Vec<i32>]) -> SolveOutcome {
        if cnf.is_empty() {
            return SolveOutcome::Satisfiable;
        }
        match splr::Certificate::try_from(cnf.to_vec()) {
            Ok(splr::Certificate::SAT(_)) => SolveOutcome::Satisfiable,
            Ok(splr::Certificate::UNSAT) => SolveOutcome::Unsatisfiable,
            Err(e) => {
                warn!(error = %e, "solver returned an error, treating as satisfiable");
                SolveOutcome::Unknown
            }
        }
    }
}

/// Sentinel backend for builds or environments without a usable solver.
#[derive(Debug, Default)]
pub struct SolverUnavailable;

impl SatBackend for SolverUnavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn solve(&self, _cnf: &[Vec<i32>]) -> SolveOutcome {
        SolveOutcome::Unknown
    }
}

/// One stateful query session: the variable interning table plus the
/// permanent clause set.
///
/// Permanent clauses are appended during encoding and read-only afterwards.
/// Query-time assumptions are passed per call and solved together with the
/// permanent clauses, so they never persist across queries.
pub struct SatSession {
    backend: Box<dyn SatBackend>,
    vars: BTreeMap<String, i32>,
    names: Vec<String>,
    clauses: Vec<Vec<i32>>,
}

impl SatSession {
    pub fn new(backend: Box<dyn SatBackend>) -> Self {
        Self {
            backend,
            vars: BTreeMap::new(),
            names: Vec::new(),
            clauses: Vec::new(),
        }
    }

    /// A session backed by the default solver.
    pub fn with_default_backend() -> Self {
        Self::new(Box::new(SplrBackend))
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Intern a boolean variable for a flag name. Idempotent.
    pub fn intern(&mut self, name: &str) -> i32 {
        if let Some(&var) = self.vars.get(name) {
            return var;
        }
        let var = self.names.len() as i32 + 1;
        self.vars.insert(name.to_string(), var);
        self.names.push(name.to_string());
        var
    }

    /// Interned names, in interning order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Assert a clause over (flag, value) literals. Monotone: clauses are
    /// never retracted.
    pub fn assert_clause(&mut self, literals: &[(&str, bool)]) {
        let clause: Vec<i32> = literals
            .iter()
            .map(|&(name, value)| {
                let var = self.intern(name);
                if value { var } else { -var }
            })
            .collect();
        if !clause.is_empty() {
            self.clauses.push(clause);
        }
    }

    /// `flag` must always be true.
    pub fn assert_always_on(&mut self, flag: &str) {
        self.assert_clause(&[(flag, true)]);
    }

    /// `flag` must always be false.
    pub fn assert_always_off(&mut self, flag: &str) {
        self.assert_clause(&[(flag, false)]);
    }

    /// `flag` being active presupposes `dependency` being active.
    pub fn assert_requires(&mut self, flag: &str, dependency: &str) {
        self.assert_clause(&[(flag, false), (dependency, true)]);
    }

    /// `a` and `b` cannot both be active.
    pub fn assert_conflicts(&mut self, a: &str, b: &str) {
        self.assert_clause(&[(a, false), (b, false)]);
    }

    /// Is the permanent theory satisfiable under the given assumptions?
    ///
    /// Assumptions are solved as unit clauses alongside the permanent set and
    /// do not persist. Names never interned are free variables and cannot
    /// constrain anything. Without a backend this conservatively answers
    /// true.
    pub fn is_satisfiable(&self, assumptions: &BTreeMap<String, bool>) -> bool {
        if !self.backend.is_available() {
            return true;
        }
        let mut cnf = self.clauses.clone();
        let mut next_free = self.names.len() as i32 + 1;
        for (name, &value) in assumptions {
            let var = match self.vars.get(name) {
                Some(&var) => var,
                None => {
                    let var = next_free;
                    next_free += 1;
                    var
                }
            };
            cnf.push(vec![if value { var } else { -var }]);
        }
        if cnf.is_empty() {
            return true;
        }
        match self.backend.solve(&cnf) {
            SolveOutcome::Unsatisfiable => false,
            SolveOutcome::Satisfiable | SolveOutcome::Unknown => true,
        }
    }

    /// Enumerate the subset-minimal unsatisfiable partial assignments over
    /// subsets of `vars` of size 1..=k, in deterministic order (smaller
    /// subsets first, subsets in input order, value vectors in binary order).
    ///
    /// An assignment extending an already-impossible smaller assignment is
    /// skipped: it proves nothing new and would only restate the smaller
    /// conflict. k = 2 bounds the search at O(4·C(|V|,2)) satisfiability
    /// checks and captures the dominant single-dependency and
    /// pairwise-exclusion violations; larger k is opt-in.
    pub fn enumerate_impossible(&self, vars: &[String], k: usize) -> Vec<BTreeMap<String, bool>> {
        if !self.backend.is_available() || vars.is_empty() || k == 0 {
            return Vec::new();
        }
        let mut impossible: Vec<BTreeMap<String, bool>> = Vec::new();
        for size in 1..=k.min(vars.len()) {
            for subset in combinations(vars.len(), size) {
                for mask in 0..(1u32 << size) {
                    let assignment: BTreeMap<String, bool> = subset
                        .iter()
                        .enumerate()
                        .map(|(bit, &i)| (vars[i].clone(), mask & (1 << bit) != 0))
                        .collect();
                    if impossible.iter().any(|seen| extends(&assignment, seen)) {
                        continue;
                    }
                    if !self.is_satisfiable(&assignment) {
                        impossible.push(assignment);
                    }
                }
            }
        }
        debug!(
            vars = vars.len(),
            k,
            found = impossible.len(),
            "impossible-state enumeration complete"
        );
        impossible
    }
}

/// Does `assignment` assign every (flag, value) pair that `smaller` assigns?
fn extends(assignment: &BTreeMap<String, bool>, smaller: &BTreeMap<String, bool>) -> bool {
    smaller
        .iter()
        .all(|(flag, value)| assignment.get(flag) == Some(value))
}

/// All index subsets of `{0..n}` of the given size, in lexicographic order.
fn combinations(n: usize, size: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(size);
    fn recurse(n: usize, size: usize, start: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            recurse(n, size, i + 1, current, out);
            current.pop();
        }
    }
    recurse(n, size, 0, &mut current, &mut out);
    out
}
