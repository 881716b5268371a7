//! LaunchDarkly-style export parser.
//!
//! The export is a JSON object keyed by flag id. Variation values are
//! heterogeneous; the flag kind is inferred from the first variation's value
//! domain. Prerequisites become dependency names, `fallthrough.variation` is
//! an index into the variations list, and per-rule rollout weights are
//! normalized from parts-per-million to a percentage.

use serde_json::Value;

use crate::model::{Flag, FlagKind, TargetingRule, Variation};
use crate::parsers::{ParseError, ParseIssue};

pub(crate) fn parse(content: &str) -> Result<(Vec<Flag>, Vec<ParseIssue>), ParseError> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| ParseError::Json(e.to_string()))?;
    let Some(flags_obj) = root.get("flags").and_then(Value::as_object) else {
        return Err(ParseError::ExpectedObjectOrArray);
    };

    let mut flags = Vec::new();
    let mut issues = Vec::new();
    for (key, data) in flags_obj {
        match parse_flag(key, data) {
            Ok(flag) => flags.push(flag),
            Err(error) => issues.push(ParseIssue {
                flag: Some(key.clone()),
                error,
            }),
        }
    }
    Ok((flags, issues))
}

fn parse_flag(key: &str, data: &Value) -> Result<Flag, ParseError> {
    // Prefer an explicit `key` field over the object key.
    let name = data
        .get("key")
        .and_then(Value::as_str)
        .unwrap_or(key)
        .to_string();
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let default_variations = vec![Value::Bool(true), Value::Bool(false)];
    let raw_variations = data
        .get("variations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or(default_variations);

    let kind = infer_kind(&raw_variations);
    let variations = build_variations(&raw_variations);

    let dependencies = data
        .get("prerequisites")
        .and_then(Value::as_array)
        .map(|prereqs| {
            prereqs
                .iter()
                .filter_map(|p| p.get("key").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let targeting_rules = data
        .get("rules")
        .and_then(Value::as_array)
        .map(|rules| build_rules(rules, &variations))
        .unwrap_or_default();

    let default_index = data
        .get("fallthrough")
        .and_then(|f| f.get("variation"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;
    let default_variation = match variations.get(default_index) {
        Some(v) => v.name.clone(),
        None => {
            return Err(ParseError::BadDefault {
                flag: name,
                index: default_index,
            });
        }
    };

    Ok(Flag {
        name,
        kind,
        enabled: data.get("on").and_then(Value::as_bool).unwrap_or(true),
        default_variation,
        variations,
        targeting_rules,
        dependencies,
        description: data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        tags: string_list(data.get("tags")),
    })
}

/// Flag kind follows the value domain of the first variation.
fn infer_kind(variations: &[Value]) -> FlagKind {
    match variations.first() {
        Some(Value::Bool(_)) | None => FlagKind::Boolean,
        Some(Value::String(_)) => FlagKind::String,
        Some(Value::Number(_)) => FlagKind::Number,
        Some(_) => FlagKind::Json,
    }
}

fn build_variations(raw: &[Value]) -> Vec<Variation> {
    raw.iter()
        .enumerate()
        .map(|(i, value)| {
            let name = match value {
                Value::Bool(true) => "on".to_string(),
                Value::Bool(false) => "off".to_string(),
                _ => format!("variation_{i}"),
            };
            Variation::new(name, value.clone())
        })
        .collect()
}

fn build_rules(rules: &[Value], variations: &[Variation]) -> Vec<TargetingRule> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let conditions = rule
                .get("clauses")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let variation_index = rule
                .get("variation")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize;
            let variation = variations
                .get(variation_index)
                .map(|v| v.name.clone())
                .unwrap_or_else(|| format!("variation_{variation_index}"));
            // Rollout weights are parts-per-million integers.
            let weight = rule
                .get("rollout")
                .and_then(|r| r.get("variations"))
                .and_then(Value::as_array)
                .and_then(|vs| vs.first())
                .and_then(|v| v.get("weight"))
                .and_then(Value::as_f64)
                .unwrap_or(100_000.0);
            TargetingRule {
                name: rule
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("rule_{i}")),
                conditions,
                variation,
                rollout_percentage: weight / 1000.0,
            }
        })
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(json: &str) -> Flag {
        let (flags, issues) = parse(json).unwrap();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(flags.len(), 1);
        flags.into_iter().next().unwrap()
    }

    #[test]
    fn minimal_flag() {
        let flag = parse_one(r#"{"flags": {"test_flag": {"on": true, "variations": [true, false]}}}"#);
        assert_eq!(flag.name, "test_flag");
        assert!(flag.enabled);
        assert_eq!(flag.kind, FlagKind::Boolean);
        assert_eq!(flag.default_variation, "on");
    }

    #[test]
    fn on_defaults_to_true() {
        let flag = parse_one(r#"{"flags": {"f": {"variations": [true, false]}}}"#);
        assert!(flag.enabled);
    }

    #[test]
    fn prerequisites_become_dependencies() {
        let flag = parse_one(
            r#"{"flags": {"new_checkout": {
                "on": true,
                "variations": [true, false],
                "prerequisites": [{"key": "payment_enabled"}]
            }}}"#,
        );
        assert_eq!(flag.dependencies, vec!["payment_enabled"]);
    }

    #[test]
    fn string_variations_infer_string_kind() {
        let flag = parse_one(
            r#"{"flags": {"ab_test": {"variations": ["control", "variant_a", "variant_b"]}}}"#,
        );
        assert_eq!(flag.kind, FlagKind::String);
        assert_eq!(flag.variations.len(), 3);
        assert_eq!(flag.variations[1].name, "variation_1");
    }

    #[test]
    fn fallthrough_selects_default_variation() {
        let flag = parse_one(
            r#"{"flags": {"f": {"variations": [true, false], "fallthrough": {"variation": 1}}}}"#,
        );
        assert_eq!(flag.default_variation, "off");
    }

    #[test]
    fn fallthrough_out_of_bounds_is_reported() {
        let (flags, issues) = parse(
            r#"{"flags": {"f": {"variations": [true, false], "fallthrough": {"variation": 9}}}}"#,
        )
        .unwrap();
        assert!(flags.is_empty());
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0].error,
            ParseError::BadDefault { index: 9, .. }
        ));
    }

    #[test]
    fn rollout_weight_normalized_from_parts_per_million() {
        let flag = parse_one(
            r#"{"flags": {"f": {
                "variations": [true, false],
                "rules": [{
                    "id": "beta-cohort",
                    "clauses": [{"attribute": "segment", "op": "in", "values": ["beta"]}],
                    "variation": 0,
                    "rollout": {"variations": [{"variation": 0, "weight": 25000}]}
                }]
            }}}"#,
        );
        let rule = &flag.targeting_rules[0];
        assert_eq!(rule.name, "beta-cohort");
        assert_eq!(rule.variation, "on");
        assert!((rule.rollout_percentage - 25.0).abs() < f64::EPSILON);
        assert_eq!(rule.conditions.len(), 1);
    }

    #[test]
    fn invalid_json_aborts() {
        assert!(matches!(parse("not json"), Err(ParseError::Json(_))));
    }

    #[test]
    fn missing_flags_object_aborts() {
        assert!(matches!(
            parse(r#"{"flags": [1, 2]}"#),
            Err(ParseError::ExpectedObjectOrArray)
        ));
    }
}
