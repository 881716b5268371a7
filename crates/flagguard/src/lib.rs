//! FlagGuard: static analysis for feature-flag configurations.
//!
//! Given a declarative flag configuration and a source tree that checks those
//! flags at runtime, FlagGuard answers two questions with certainty: which
//! combinations of flag values are unsatisfiable under the declared
//! constraints, and which source regions are therefore unreachable.
//!
//! The pipeline runs in phases with no shared mutable state between them:
//! config parsing ([`parsers`]) produces a [`model::FlagSet`]; source
//! scanning ([`scanner`]) produces a [`model::CheckSiteSet`]; the constraint
//! encoder lowers the flag set into a propositional theory; and the SAT-backed
//! analyses ([`analysis`]) classify conflicts, dead regions, and code paths.
//! The [`analyzer`] module ties the phases together and assembles the final
//! [`report::AnalysisReport`].

pub mod analysis;
pub mod analyzer;
pub mod cli;
pub mod model;
pub mod parsers;
pub mod report;
pub mod reporters;
pub mod scanner;

pub use analyzer::{Analyzer, AnalyzerOptions};
pub use parsers::{Dialect, ParseError, ParsedConfig};
pub use scanner::{ScannerOptions, SourceScanner};
pub use model::{
    CheckKind, CheckSite, CheckSiteSet, Conflict, ConflictSeverity, DeadRegion, DependencyEdge,
    EdgeKind, EdgeOrigin, Flag, FlagKind, FlagSet, FlagValidationError, TargetingRule, Variation,
};
pub use report::AnalysisReport;
