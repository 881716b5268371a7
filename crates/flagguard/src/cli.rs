//! flagguard: static analyzer for feature-flag configurations.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::parsers::Dialect;

/// flagguard: prove which feature-flag combinations are impossible and which
/// code regions are dead.
///
/// Parses flag-platform exports, scans source trees for flag checks, and
/// answers reachability with a SAT solver.
#[derive(Debug, Parser)]
#[command(name = "flagguard", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline and render a report.
    Analyze(AnalyzeArgs),

    /// Check whether a specific flag-value assignment is possible.
    Check(CheckArgs),

    /// Scan a source tree for flag checks, without a configuration.
    Scan(ScanArgs),

    /// Parse a configuration and dump the normalized flag set.
    Parse(ParseArgs),
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

// -- analyze --

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Path to the flag configuration file.
    #[arg(long)]
    pub config: PathBuf,

    /// Root of the source tree to scan.
    #[arg(long)]
    pub source: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: ReportFormat,

    /// Force a configuration dialect instead of auto-detecting.
    #[arg(long)]
    pub dialect: Option<Dialect>,

    /// Flag that must always be on. Repeatable.
    #[arg(long = "require")]
    pub required: Vec<String>,

    /// Comma-separated group of mutually exclusive flags. Repeatable.
    #[arg(long = "exclusive")]
    pub exclusive: Vec<String>,

    /// Extra directory name to skip while scanning. Repeatable.
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,

    /// Stop scanning after this many files.
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Maximum flags combined per impossible-state check.
    #[arg(long, default_value_t = 2)]
    pub conflict_arity: usize,
}

// -- check --

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Path to the flag configuration file.
    #[arg(long)]
    pub config: PathBuf,

    /// Flag assignment to test, as `name=true` or `name=false`. Repeatable.
    #[arg(long = "set", required = true)]
    pub assignments: Vec<String>,

    /// Comma-separated group of mutually exclusive flags. Repeatable.
    #[arg(long = "exclusive")]
    pub exclusive: Vec<String>,

    /// Flag that must always be on. Repeatable.
    #[arg(long = "require")]
    pub required: Vec<String>,
}

// -- scan --

#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Root of the source tree to scan.
    pub source: PathBuf,

    /// Emit the check sites as JSON instead of a text listing.
    #[arg(long)]
    pub json: bool,

    /// Extra directory name to skip while scanning. Repeatable.
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,
}

// -- parse --

#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// Path to the flag configuration file.
    pub config: PathBuf,

    /// Force a configuration dialect instead of auto-detecting.
    #[arg(long)]
    pub dialect: Option<Dialect>,
}
