//! Source scanner: walks a directory tree and extracts flag-check sites.
//!
//! Files are selected by extension and dispatched to a per-language
//! extractor; directory names matching the exclusion set are pruned without
//! descent. The scan is single-threaded and dispatches files in lexicographic
//! path order, so the returned [`CheckSiteSet`] is a deterministic function
//! of the input tree. A file that cannot be read or extracted contributes an
//! error note and zero check sites; it never fails the scan.

mod ast;
mod fallback;
pub mod languages;

pub use ast::ExtractError;
pub use languages::Language;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::model::{CheckSite, CheckSiteSet, ScanNote, ScanNoteKind};

/// Directory names never descended into.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    "venv",
    ".venv",
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    "dist",
    "build",
    "target",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
];

/// Extraction fidelity. AST extraction is preferred; the regex catalogue is
/// the fallback when the toolchain cannot handle a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    #[default]
    Ast,
    Regex,
}

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScannerOptions {
    /// Directory names to prune, in addition to [`DEFAULT_EXCLUDES`].
    pub extra_excludes: Vec<String>,
    /// Stop after this many files have been dispatched.
    pub max_files: Option<usize>,
    pub mode: ExtractionMode,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            extra_excludes: Vec::new(),
            max_files: None,
            mode: ExtractionMode::Ast,
        }
    }
}

/// Walks a source tree and collects flag-check sites.
pub struct SourceScanner {
    excludes: BTreeSet<String>,
    max_files: Option<usize>,
    mode: ExtractionMode,
}

impl SourceScanner {
    pub fn new(options: ScannerOptions) -> Self {
        let mut excludes: BTreeSet<String> =
            DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(options.extra_excludes);
        Self {
            excludes,
            max_files: options.max_files,
            mode: options.mode,
        }
    }

    /// Scan a directory tree for flag-check sites.
    pub fn scan(&self, root: &Path) -> CheckSiteSet {
        let started = Instant::now();
        let mut sites = Vec::new();
        let mut notes = Vec::new();
        let mut files_scanned = 0usize;

        for path in self.collect_files(root) {
            if self.max_files.is_some_and(|max| files_scanned >= max) {
                break;
            }
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    notes.push(ScanNote {
                        file: path.clone(),
                        kind: ScanNoteKind::Error,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            let ext = extension_of(&path);
            let Some(lang) = Language::from_extension(&ext) else {
                continue;
            };
            let (file_sites, file_notes) = self.extract(lang, &ext, &path, &content);
            sites.extend(file_sites);
            notes.extend(file_notes);
            files_scanned += 1;
        }

        let elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            files = files_scanned,
            sites = sites.len(),
            elapsed_seconds,
            "scan complete"
        );
        CheckSiteSet {
            sites,
            files_scanned,
            elapsed_seconds,
            notes,
        }
    }

    /// Scan a single file. Unknown extensions yield an empty result.
    pub fn scan_file(&self, path: &Path) -> (Vec<CheckSite>, Vec<ScanNote>) {
        let ext = extension_of(path);
        let Some(lang) = Language::from_extension(&ext) else {
            return (Vec::new(), Vec::new());
        };
        match std::fs::read_to_string(path) {
            Ok(content) => self.extract(lang, &ext, path, &content),
            Err(e) => (
                Vec::new(),
                vec![ScanNote {
                    file: path.to_path_buf(),
                    kind: ScanNoteKind::Error,
                    message: e.to_string(),
                }],
            ),
        }
    }

    fn extract(
        &self,
        lang: Language,
        ext: &str,
        path: &Path,
        content: &str,
    ) -> (Vec<CheckSite>, Vec<ScanNote>) {
        match self.mode {
            ExtractionMode::Regex => (fallback::extract_file(lang, path, content), Vec::new()),
            ExtractionMode::Ast => match ast::extract_file(lang, ext, path, content) {
                Ok(result) => result,
                Err(e) => {
                    // AST toolchain unavailable for this file; degrade to the
                    // regex catalogue rather than dropping the file.
                    warn!(
                        file = %path.display(),
                        error = %e,
                        "AST extraction failed, using regex fallback"
                    );
                    (fallback::extract_file(lang, path, content), Vec::new())
                }
            },
        }
    }

    /// Candidate files under `root`, absolute and lexicographically sorted.
    fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !self.excludes.contains(name.as_ref())
            })
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| Language::from_extension(&extension_of(path)).is_some())
            .collect();
        files.sort();
        debug!(candidates = files.len(), root = %root.display(), "collected files");
        files
    }
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::new(ScannerOptions::default())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
