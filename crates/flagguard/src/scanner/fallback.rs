//! Regex fallback extraction, for files the AST toolchain cannot handle.
//!
//! Matches a fixed catalogue of patterns built from the same check-function
//! names as the AST extractors, with quoted literal arguments. Polarity is
//! inferred from the token immediately preceding the match; the enclosing
//! function comes from scanning preceding lines for a function-definition
//! pattern, bounded by a class-definition pattern. This is approximate by
//! design: multi-line negations and De Morgan rewrites are out of reach here.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{CheckKind, CheckSite};
use crate::scanner::languages::{Language, JS_CHECK_FUNCTIONS, PYTHON_CHECK_FUNCTIONS};

/// How far back the enclosing-function scan looks.
const FUNCTION_SCAN_LINES: usize = 100;

fn python_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PYTHON_CHECK_FUNCTIONS
            .iter()
            .map(|name| {
                Regex::new(&format!(r#"\b{name}\s*\(\s*['"]([^'"]+)['"]"#))
                    .unwrap_or_else(|e| panic!("invalid builtin pattern for {name}: {e}"))
            })
            .collect()
    })
}

fn js_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        JS_CHECK_FUNCTIONS
            .iter()
            .map(|name| {
                Regex::new(&format!(r#"\b{name}\s*\(\s*['"`]([^'"`]+)['"`]"#))
                    .unwrap_or_else(|e| panic!("invalid builtin pattern for {name}: {e}"))
            })
            .collect()
    })
}

pub(crate) fn extract_file(lang: Language, path: &Path, source: &str) -> Vec<CheckSite> {
    let patterns = match lang {
        Language::Python => python_patterns(),
        Language::JavaScript | Language::TypeScript => js_patterns(),
    };

    let lines: Vec<&str> = source.lines().collect();
    let mut sites = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        for pattern in patterns {
            for captures in pattern.captures_iter(line) {
                let matched = captures.get(0).expect("match group 0 always present");
                let flag_name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                if flag_name.is_empty() {
                    continue;
                }
                sites.push(CheckSite {
                    flag_name: flag_name.to_string(),
                    file: path.to_path_buf(),
                    start_line: index as u32 + 1,
                    end_line: index as u32 + 1,
                    column: matched.start() as u32,
                    end_column: matched.end() as u32,
                    function: find_enclosing_function(lang, &lines, index),
                    class: None,
                    kind: infer_check_kind(lang, line),
                    negated: is_negated(lang, &line[..matched.start()]),
                    snippet: line.trim().to_string(),
                });
            }
        }
    }
    sites
}

/// Negation looks only at what immediately precedes the match on the line.
fn is_negated(lang: Language, prefix: &str) -> bool {
    let trimmed = prefix.trim_end();
    match lang {
        Language::Python => {
            trimmed.ends_with("not")
                && !trimmed
                    .chars()
                    .rev()
                    .nth(3)
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
        }
        Language::JavaScript | Language::TypeScript => trimmed.ends_with('!'),
    }
}

fn infer_check_kind(lang: Language, line: &str) -> CheckKind {
    let stripped = line.trim_start();
    match lang {
        Language::Python => {
            if stripped.starts_with("if ") || stripped.starts_with("elif ") {
                CheckKind::If
            } else if stripped.starts_with("match ") {
                CheckKind::Match
            } else if line.contains(" if ") && line.contains(" else ") {
                CheckKind::Ternary
            } else if line.contains('=') && !line.contains("==") {
                CheckKind::Assignment
            } else {
                CheckKind::Expression
            }
        }
        Language::JavaScript | Language::TypeScript => {
            if stripped.starts_with("if") || stripped.contains("} else if") {
                CheckKind::If
            } else if stripped.starts_with("switch") {
                CheckKind::Switch
            } else if line.contains('?') && line.contains(':') {
                CheckKind::Ternary
            } else if line.contains('=') && !line.contains("==") {
                CheckKind::Assignment
            } else {
                CheckKind::Expression
            }
        }
    }
}

fn find_enclosing_function(lang: Language, lines: &[&str], current: usize) -> Option<String> {
    static PY_DEF: OnceLock<Regex> = OnceLock::new();
    static PY_CLASS: OnceLock<Regex> = OnceLock::new();
    static JS_DEFS: OnceLock<Vec<Regex>> = OnceLock::new();

    let floor = current.saturating_sub(FUNCTION_SCAN_LINES);
    match lang {
        Language::Python => {
            let def = PY_DEF.get_or_init(|| {
                Regex::new(r"^\s*(?:async\s+)?def\s+(\w+)\s*\(").expect("builtin pattern")
            });
            let class = PY_CLASS
                .get_or_init(|| Regex::new(r"^\s*class\s+\w+").expect("builtin pattern"));
            for i in (floor..=current).rev() {
                if let Some(captures) = def.captures(lines[i]) {
                    return Some(captures[1].to_string());
                }
                if i < current && class.is_match(lines[i]) {
                    return None;
                }
            }
            None
        }
        Language::JavaScript | Language::TypeScript => {
            let defs = JS_DEFS.get_or_init(|| {
                [
                    r"function\s+(\w+)\s*\(",
                    r"(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|\w+\s*=>)",
                    r"(\w+)\s*:\s*(?:async\s+)?function\s*\(",
                    r"^\s*(?:async\s+)?(\w+)\s*\([^)]*\)\s*\{",
                ]
                .iter()
                .map(|p| Regex::new(p).expect("builtin pattern"))
                .collect()
            });
            for i in (floor..=current).rev() {
                let line = lines[i];
                for def in defs {
                    if let Some(captures) = def.captures(line) {
                        return Some(captures[1].to_string());
                    }
                }
                if i < current && line.trim_start().starts_with("class ") {
                    return None;
                }
            }
            None
        }
    }
}
