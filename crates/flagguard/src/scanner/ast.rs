//! AST-fidelity flag-check extraction via tree-sitter.
//!
//! Locates call expressions whose callee (bare identifier or rightmost member
//! of a dotted access) is in the language's check-function catalogue and whose
//! first argument is a literal string. Polarity is the parity of boolean-not
//! ancestors between the call and its nearest boolean-decision parent; the
//! check kind is the nearest enclosing decision construct; the enclosing
//! function and class come from the nearest definition ancestors.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::model::{CheckKind, CheckSite, ScanNote, ScanNoteKind};
use crate::scanner::languages::Language;

/// Failure to run the AST toolchain on a file. The scanner treats grammar
/// failures as "toolchain unavailable" and falls back to regex extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("grammar unavailable: {0}")]
    Grammar(String),
    #[error("parser produced no syntax tree")]
    NoTree,
}

pub(crate) fn extract_file(
    lang: Language,
    ext: &str,
    path: &Path,
    source: &str,
) -> Result<(Vec<CheckSite>, Vec<ScanNote>), ExtractError> {
    let mut parser = Parser::new();
    parser
        .set_language(&lang.grammar(ext))
        .map_err(|e| ExtractError::Grammar(e.to_string()))?;
    let tree = parser.parse(source, None).ok_or(ExtractError::NoTree)?;

    let lines: Vec<&str> = source.lines().collect();
    let mut sites = Vec::new();
    let mut notes = Vec::new();
    walk(
        lang,
        tree.root_node(),
        source.as_bytes(),
        &lines,
        path,
        &mut sites,
        &mut notes,
    );
    Ok((sites, notes))
}

fn walk(
    lang: Language,
    node: Node<'_>,
    src: &[u8],
    lines: &[&str],
    path: &Path,
    sites: &mut Vec<CheckSite>,
    notes: &mut Vec<ScanNote>,
) {
    if node.kind() == lang.call_kind() {
        inspect_call(lang, node, src, lines, path, sites, notes);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk(lang, child, src, lines, path, sites, notes);
        }
    }
}

fn inspect_call(
    lang: Language,
    call: Node<'_>,
    src: &[u8],
    lines: &[&str],
    path: &Path,
    sites: &mut Vec<CheckSite>,
    notes: &mut Vec<ScanNote>,
) {
    let Some(callee) = callee_name(lang, call, src) else {
        return;
    };
    if !lang.check_functions().contains(&callee.as_str()) {
        return;
    }

    let Some(first_arg) = first_argument(call) else {
        return;
    };
    let Some(flag_name) = literal_string(lang, first_arg, src) else {
        notes.push(ScanNote {
            file: path.to_path_buf(),
            kind: ScanNoteKind::Warning,
            message: format!(
                "line {}: non-literal flag argument to {callee}()",
                call.start_position().row + 1
            ),
        });
        return;
    };
    if flag_name.is_empty() {
        return;
    }

    let context = AncestorContext::collect(lang, call, src);
    let start = call.start_position();
    let end = call.end_position();
    sites.push(CheckSite {
        flag_name,
        file: path.to_path_buf(),
        start_line: start.row as u32 + 1,
        end_line: end.row as u32 + 1,
        column: start.column as u32,
        end_column: end.column as u32,
        function: context.function,
        class: context.class,
        kind: context.kind,
        negated: context.negations % 2 == 1,
        snippet: lines.get(start.row).map(|l| l.trim()).unwrap_or_default().to_string(),
    });
}

/// Bare identifier, or the rightmost member of a dotted access.
fn callee_name(lang: Language, call: Node<'_>, src: &[u8]) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    let name_node = match (lang, function.kind()) {
        (_, "identifier") => function,
        (Language::Python, "attribute") => function.child_by_field_name("attribute")?,
        (Language::JavaScript | Language::TypeScript, "member_expression") => {
            function.child_by_field_name("property")?
        }
        _ => return None,
    };
    node_text(name_node, src).map(str::to_string)
}

/// The first non-comment named child of the argument list.
fn first_argument(call: Node<'_>) -> Option<Node<'_>> {
    let args = call.child_by_field_name("arguments")?;
    (0..args.named_child_count())
        .filter_map(|i| args.named_child(i))
        .find(|n| n.kind() != "comment")
}

/// Decode a literal string argument. Interpolated strings (f-strings,
/// template substitutions) are not literals and yield `None`.
fn literal_string(lang: Language, node: Node<'_>, src: &[u8]) -> Option<String> {
    match (lang, node.kind()) {
        (Language::Python, "string") => {
            if has_child_kind(node, "interpolation") {
                return None;
            }
            Some(collect_fragments(node, src, &["string_content", "escape_sequence"]))
        }
        (Language::JavaScript | Language::TypeScript, "string") => {
            Some(collect_fragments(node, src, &["string_fragment", "escape_sequence"]))
        }
        (Language::JavaScript | Language::TypeScript, "template_string") => {
            if has_child_kind(node, "template_substitution") {
                return None;
            }
            Some(collect_fragments(node, src, &["string_fragment", "escape_sequence"]))
        }
        _ => None,
    }
}

fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    (0..node.child_count()).any(|i| node.child(i).is_some_and(|c| c.kind() == kind))
}

fn collect_fragments(node: Node<'_>, src: &[u8], kinds: &[&str]) -> String {
    let mut out = String::new();
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                if let Some(text) = node_text(child, src) {
                    out.push_str(text);
                }
            }
        }
    }
    out
}

fn node_text<'a>(node: Node<'_>, src: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(src).ok()
}

/// Everything the ancestor chain tells us about a call site.
struct AncestorContext {
    negations: u32,
    kind: CheckKind,
    function: Option<String>,
    class: Option<String>,
}

impl AncestorContext {
    fn collect(lang: Language, call: Node<'_>, src: &[u8]) -> Self {
        let mut ctx = Self {
            negations: 0,
            kind: CheckKind::Expression,
            function: None,
            class: None,
        };
        // Negation counting stops at the nearest decision construct; a not
        // outside the enclosing decision cannot flip this check's polarity.
        let mut decided = false;
        let mut cursor = call.parent();
        while let Some(node) = cursor {
            let kind = node.kind();
            if !decided {
                if lang.is_negation_kind(kind) && is_boolean_not(lang, node, src) {
                    ctx.negations += 1;
                }
                if let Some(check_kind) = lang.decision_kind(kind) {
                    ctx.kind = check_kind;
                    decided = true;
                } else if lang.is_polarity_boundary(kind) {
                    decided = true;
                }
            }
            if lang.is_function_kind(kind) {
                decided = true;
                if ctx.function.is_none() {
                    ctx.function = definition_name(lang, node, src);
                }
            }
            if ctx.class.is_none() && lang.is_class_kind(kind) {
                decided = true;
                ctx.class = node
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, src))
                    .map(str::to_string);
            }
            cursor = node.parent();
        }
        ctx
    }
}

fn is_boolean_not(lang: Language, node: Node<'_>, src: &[u8]) -> bool {
    match lang {
        Language::Python => true,
        Language::JavaScript | Language::TypeScript => node
            .child_by_field_name("operator")
            .and_then(|op| node_text(op, src))
            .map(|op| op == "!")
            .unwrap_or(false),
    }
}

/// Name of a definition node. Anonymous functions take their name from the
/// surrounding declarator or property when one exists.
fn definition_name(lang: Language, node: Node<'_>, src: &[u8]) -> Option<String> {
    if let Some(name) = node
        .child_by_field_name("name")
        .and_then(|n| node_text(n, src))
    {
        return Some(name.to_string());
    }
    if matches!(lang, Language::JavaScript | Language::TypeScript) {
        if let Some(parent) = node.parent() {
            let name_node = match parent.kind() {
                "variable_declarator" => parent.child_by_field_name("name"),
                "pair" => parent.child_by_field_name("key"),
                "assignment_expression" => parent.child_by_field_name("left"),
                _ => None,
            };
            return name_node.and_then(|n| node_text(n, src)).map(str::to_string);
        }
    }
    None
}
