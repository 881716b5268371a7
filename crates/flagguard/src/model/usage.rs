//! Flag-check sites extracted from source code and the scan result set.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Syntactic construct a flag check appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    If,
    Ternary,
    Switch,
    Assignment,
    Expression,
    Match,
}

impl CheckKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Ternary => "ternary",
            Self::Switch => "switch",
            Self::Assignment => "assignment",
            Self::Expression => "expression",
            Self::Match => "match",
        }
    }
}

/// A single occurrence of a flag check in source.
///
/// `negated = true` means the code behind this check runs when the flag is
/// off. Lines are 1-indexed, columns 0-indexed; `start_line <= end_line`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSite {
    /// Literal flag name extracted from the first call argument.
    pub flag_name: String,
    pub file: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    pub column: u32,
    pub end_column: u32,
    pub function: Option<String>,
    pub class: Option<String>,
    pub kind: CheckKind,
    pub negated: bool,
    pub snippet: String,
}

impl CheckSite {
    /// `file:line` rendering used in conflict cross-references.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file.display(), self.start_line)
    }
}

/// Classification of a scan diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanNoteKind {
    /// The file contributed zero check sites because of this error.
    Error,
    /// Informational, e.g. a known check function with a non-literal argument.
    Warning,
}

/// A per-file diagnostic recorded during scanning. Non-fatal by design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanNote {
    pub file: PathBuf,
    pub kind: ScanNoteKind,
    pub message: String,
}

/// All check sites found in one scan, plus scan metadata.
///
/// Ordering is stable (lexicographic file dispatch) but carries no semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckSiteSet {
    pub sites: Vec<CheckSite>,
    /// Files successfully dispatched to an extractor.
    pub files_scanned: usize,
    pub elapsed_seconds: f64,
    pub notes: Vec<ScanNote>,
}

impl CheckSiteSet {
    pub fn by_flag<'a>(&'a self, flag_name: &'a str) -> impl Iterator<Item = &'a CheckSite> {
        self.sites.iter().filter(move |s| s.flag_name == flag_name)
    }

    pub fn by_file<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a CheckSite> {
        self.sites.iter().filter(move |s| s.file == file)
    }

    /// Unique flag names mentioned anywhere in the scanned tree.
    pub fn unique_flags(&self) -> BTreeSet<&str> {
        self.sites.iter().map(|s| s.flag_name.as_str()).collect()
    }

    /// Per-file error messages (excluding informational warnings).
    pub fn errors(&self) -> impl Iterator<Item = &ScanNote> {
        self.notes.iter().filter(|n| n.kind == ScanNoteKind::Error)
    }
}
