//! SAT-backed analyses: constraint encoding, conflict detection, dead-code
//! classification, and path/dependency analysis.
//!
//! The encoder lowers a [`crate::model::FlagSet`] into a propositional theory
//! held by a [`sat::SatSession`]; the detectors query that session. The
//! session's permanent clause set is appended to only during encoding and is
//! read-only afterwards; query-time assumptions never persist across queries.

pub mod conflicts;
pub mod dead_code;
pub mod paths;
pub mod sat;
pub mod theory;

pub use conflicts::ConflictDetector;
pub use dead_code::DeadCodeFinder;
pub use paths::{CodePath, DependencyGraph, GraphNode, PathAnalysis, PathAnalyzer};
pub use sat::{SatBackend, SatSession, SolveOutcome, SolverUnavailable, SplrBackend};
pub use theory::{
    ConstraintEncoder, EncodeOptions, EncodedTheory, UnresolvedDependency, DEFAULT_CONFLICT_ARITY,
};
