//! Language registry for source scanning.
//!
//! The set of supported languages is closed: Python, JavaScript, and
//! TypeScript (which shares the JavaScript conventions). Each language maps a
//! file extension set to a tree-sitter grammar and a flag-check function
//! catalogue.

use crate::model::CheckKind;

/// Flag-check callee names recognized in Python sources.
pub const PYTHON_CHECK_FUNCTIONS: &[&str] = &[
    "is_enabled",
    "is_feature_enabled",
    "feature_enabled",
    "variation",
    "get_flag",
    "has_feature",
    "check_feature",
    "is_on",
    "is_active",
    "get_feature_flag",
];

/// Flag-check callee names recognized in JavaScript/TypeScript sources: the
/// camelCase equivalents of the Python catalogue.
pub const JS_CHECK_FUNCTIONS: &[&str] = &[
    "isEnabled",
    "isFeatureEnabled",
    "featureEnabled",
    "variation",
    "getFlag",
    "hasFeature",
    "checkFeature",
    "isOn",
    "isActive",
    "getFeatureFlag",
];

/// A supported source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Dispatch on a lowercase file extension. Unknown extensions are skipped
    /// by the scanner.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyw" => Some(Self::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
        }
    }

    pub fn check_functions(self) -> &'static [&'static str] {
        match self {
            Self::Python => PYTHON_CHECK_FUNCTIONS,
            Self::JavaScript | Self::TypeScript => JS_CHECK_FUNCTIONS,
        }
    }

    /// The tree-sitter grammar for a concrete file of this language. The
    /// extension matters for TypeScript, where `.tsx` uses the TSX grammar.
    pub fn grammar(self, ext: &str) -> tree_sitter::Language {
        match self {
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => {
                if ext == "tsx" {
                    tree_sitter_typescript::LANGUAGE_TSX.into()
                } else {
                    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
                }
            }
        }
    }

    /// Node kind of a call expression.
    pub fn call_kind(self) -> &'static str {
        match self {
            Self::Python => "call",
            Self::JavaScript | Self::TypeScript => "call_expression",
        }
    }

    /// True when `kind` is a boolean-not node for this language. For
    /// JavaScript the caller must additionally check the operator text.
    pub fn is_negation_kind(self, kind: &str) -> bool {
        match self {
            Self::Python => kind == "not_operator",
            Self::JavaScript | Self::TypeScript => kind == "unary_expression",
        }
    }

    /// Map an ancestor node kind to the check kind it implies, if any.
    pub fn decision_kind(self, kind: &str) -> Option<CheckKind> {
        match self {
            Self::Python => match kind {
                "if_statement" => Some(CheckKind::If),
                "conditional_expression" => Some(CheckKind::Ternary),
                "assignment" | "augmented_assignment" => Some(CheckKind::Assignment),
                "match_statement" => Some(CheckKind::Match),
                _ => None,
            },
            Self::JavaScript | Self::TypeScript => match kind {
                "if_statement" => Some(CheckKind::If),
                "ternary_expression" => Some(CheckKind::Ternary),
                "switch_statement" => Some(CheckKind::Switch),
                "variable_declarator" | "assignment_expression" | "augmented_assignment_expression" => {
                    Some(CheckKind::Assignment)
                }
                _ => None,
            },
        }
    }

    /// True when `kind` bounds the polarity walk without mapping to a check
    /// kind (loops behave like decisions for negation purposes).
    pub fn is_polarity_boundary(self, kind: &str) -> bool {
        matches!(kind, "while_statement" | "for_statement" | "do_statement")
    }

    /// True when `kind` is a function-definition node.
    pub fn is_function_kind(self, kind: &str) -> bool {
        match self {
            Self::Python => kind == "function_definition",
            Self::JavaScript | Self::TypeScript => matches!(
                kind,
                "function_declaration"
                    | "generator_function_declaration"
                    | "function_expression"
                    | "generator_function"
                    | "arrow_function"
                    | "method_definition"
            ),
        }
    }

    /// True when `kind` is a class-definition node.
    pub fn is_class_kind(self, kind: &str) -> bool {
        match self {
            Self::Python => kind == "class_definition",
            Self::JavaScript | Self::TypeScript => {
                matches!(kind, "class_declaration" | "class")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("pyw"), Some(Language::Python));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("rb"), None);
    }

    #[test]
    fn typescript_shares_js_catalogue() {
        assert_eq!(
            Language::TypeScript.check_functions(),
            Language::JavaScript.check_functions()
        );
    }

    #[test]
    fn grammars_load() {
        // Loading a grammar validates the ABI handshake with tree-sitter.
        for (lang, ext) in [
            (Language::Python, "py"),
            (Language::JavaScript, "js"),
            (Language::TypeScript, "ts"),
            (Language::TypeScript, "tsx"),
        ] {
            let mut parser = tree_sitter::Parser::new();
            parser.set_language(&lang.grammar(ext)).unwrap();
        }
    }
}
