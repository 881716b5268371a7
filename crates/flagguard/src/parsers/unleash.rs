//! Unleash-style document parser.
//!
//! Accepts YAML or JSON with a top-level `features` sequence. Variants map to
//! variations (a variant payload type selects the flag kind); strategies map
//! to targeting rules, with structured decoding for the well-known
//! `userWithId` and `gradualRollout` strategies and opaque condition records
//! for everything else. Unleash has no native dependency concept.

use serde_json::{json, Value};

use crate::model::{Flag, FlagKind, TargetingRule, Variation};
use crate::parsers::{ParseError, ParseIssue};

pub(crate) fn parse(content: &str) -> Result<(Vec<Flag>, Vec<ParseIssue>), ParseError> {
    // serde_yaml also accepts JSON documents; keep a JSON fallback for
    // inputs that YAML rejects.
    let root: Value = match serde_yaml::from_str(content) {
        Ok(value) => value,
        Err(yaml_err) => serde_json::from_str(content)
            .map_err(|_| ParseError::Yaml(yaml_err.to_string()))?,
    };
    if root.is_null() {
        return Ok((Vec::new(), Vec::new()));
    }

    let features = match root.get("features") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => return Err(ParseError::ExpectedObjectOrArray),
        None => &[],
    };

    let mut flags = Vec::new();
    let mut issues = Vec::new();
    for feature in features {
        match parse_feature(feature) {
            Ok(flag) => flags.push(flag),
            Err(error) => issues.push(ParseIssue {
                flag: feature
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                error,
            }),
        }
    }
    Ok((flags, issues))
}

fn parse_feature(data: &Value) -> Result<Flag, ParseError> {
    let name = data
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let variants = data
        .get("variants")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let kind = kind_from_variants(&variants);

    let mut variations: Vec<Variation> = variants.iter().map(variation_from_variant).collect();
    if variations.is_empty() {
        variations = vec![
            Variation::new("on", Value::Bool(true)),
            Variation::new("off", Value::Bool(false)),
        ];
    }

    let targeting_rules = data
        .get("strategies")
        .and_then(Value::as_array)
        .map(|strategies| build_rules(strategies))
        .unwrap_or_default();

    Ok(Flag {
        name,
        kind,
        enabled: data.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        default_variation: variations[0].name.clone(),
        variations,
        targeting_rules,
        // Unleash has no native dependency concept.
        dependencies: Vec::new(),
        description: data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        tags: tag_list(data.get("tags")),
    })
}

/// The payload type of the first variant, when present, selects the kind.
fn kind_from_variants(variants: &[Value]) -> FlagKind {
    let payload_type = variants
        .first()
        .and_then(|v| v.get("payload"))
        .and_then(|p| p.get("type"))
        .and_then(Value::as_str);
    match payload_type {
        Some("string") => FlagKind::String,
        Some("number") => FlagKind::Number,
        Some("json") => FlagKind::Json,
        _ => FlagKind::Boolean,
    }
}

fn variation_from_variant(variant: &Value) -> Variation {
    let name = variant
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let value = variant
        .get("payload")
        .and_then(|p| p.get("value"))
        .cloned()
        .unwrap_or_else(|| Value::String(name.clone()));
    Variation::new(name, value)
}

fn build_rules(strategies: &[Value]) -> Vec<TargetingRule> {
    strategies
        .iter()
        .enumerate()
        .map(|(i, strategy)| {
            let name = strategy
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("strategy")
                .to_string();
            let parameters = strategy.get("parameters").cloned().unwrap_or(Value::Null);
            let mut conditions = decode_strategy(&name, &parameters);

            for constraint in strategy
                .get("constraints")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                conditions.push(json!({
                    "attribute": constraint.get("contextName").cloned().unwrap_or_default(),
                    "op": constraint
                        .get("operator")
                        .cloned()
                        .unwrap_or_else(|| Value::String("IN".to_string())),
                    "values": constraint.get("values").cloned().unwrap_or_default(),
                }));
            }

            TargetingRule {
                name: format!("{name}_{i}"),
                conditions,
                variation: "on".to_string(),
                rollout_percentage: percentage(&parameters),
            }
        })
        .collect()
}

/// Structured decoding for the well-known strategies; everything else becomes
/// an opaque condition record carrying the raw parameters.
fn decode_strategy(name: &str, parameters: &Value) -> Vec<Value> {
    match name {
        "userWithId" => {
            let user_ids = parameters
                .get("userIds")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if user_ids.is_empty() {
                Vec::new()
            } else {
                let values: Vec<&str> = user_ids.split(',').map(str::trim).collect();
                vec![json!({"attribute": "userId", "op": "in", "values": values})]
            }
        }
        "gradualRollout" => {
            vec![json!({
                "attribute": "rollout",
                "op": "percentage",
                "values": [percentage(parameters)],
            })]
        }
        "default" => Vec::new(),
        _ => vec![json!({"strategy": name, "parameters": parameters})],
    }
}

fn percentage(parameters: &Value) -> f64 {
    match parameters.get("percentage") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(100.0),
        Some(Value::String(s)) => s.parse().unwrap_or(100.0),
        _ => 100.0,
    }
}

fn tag_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|t| match t {
                    Value::Object(map) => map
                        .get("value")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(content: &str) -> Flag {
        let (flags, issues) = parse(content).unwrap();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(flags.len(), 1);
        flags.into_iter().next().unwrap()
    }

    #[test]
    fn minimal_yaml_feature() {
        let flag = parse_one("features:\n  - name: dark_mode\n    enabled: false\n");
        assert_eq!(flag.name, "dark_mode");
        assert!(!flag.enabled);
        assert_eq!(flag.kind, FlagKind::Boolean);
        assert_eq!(flag.default_variation, "on");
        assert!(flag.dependencies.is_empty());
    }

    #[test]
    fn enabled_defaults_to_true() {
        let flag = parse_one("features:\n  - name: f\n");
        assert!(flag.enabled);
    }

    #[test]
    fn variant_payload_selects_kind() {
        let flag = parse_one(concat!(
            "features:\n",
            "  - name: banner\n",
            "    variants:\n",
            "      - name: blue\n",
            "        payload: {type: string, value: '#0000ff'}\n",
            "      - name: green\n",
            "        payload: {type: string, value: '#00ff00'}\n",
        ));
        assert_eq!(flag.kind, FlagKind::String);
        assert_eq!(flag.variations.len(), 2);
        assert_eq!(flag.default_variation, "blue");
        assert_eq!(flag.variations[0].value, Value::String("#0000ff".to_string()));
    }

    #[test]
    fn user_with_id_strategy_is_decoded() {
        let flag = parse_one(concat!(
            "features:\n",
            "  - name: beta\n",
            "    strategies:\n",
            "      - name: userWithId\n",
            "        parameters: {userIds: 'u1,u2'}\n",
        ));
        let rule = &flag.targeting_rules[0];
        assert_eq!(rule.name, "userWithId_0");
        assert_eq!(rule.conditions[0]["op"], "in");
        assert_eq!(rule.conditions[0]["values"][1], "u2");
    }

    #[test]
    fn gradual_rollout_strategy_carries_percentage() {
        let flag = parse_one(concat!(
            "features:\n",
            "  - name: rollout\n",
            "    strategies:\n",
            "      - name: gradualRollout\n",
            "        parameters: {percentage: '25'}\n",
        ));
        let rule = &flag.targeting_rules[0];
        assert!((rule.rollout_percentage - 25.0).abs() < f64::EPSILON);
        assert_eq!(rule.conditions[0]["op"], "percentage");
    }

    #[test]
    fn unknown_strategy_becomes_opaque_record() {
        let flag = parse_one(concat!(
            "features:\n",
            "  - name: f\n",
            "    strategies:\n",
            "      - name: remoteAddress\n",
            "        parameters: {IPs: '10.0.0.1'}\n",
        ));
        assert_eq!(flag.targeting_rules[0].conditions[0]["strategy"], "remoteAddress");
    }

    #[test]
    fn json_document_accepted() {
        let flag = parse_one(r#"{"features": [{"name": "f", "enabled": true}]}"#);
        assert_eq!(flag.name, "f");
    }

    #[test]
    fn missing_name_is_per_flag_issue() {
        let (flags, issues) =
            parse("features:\n  - enabled: true\n  - name: ok\n").unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].error, ParseError::MissingName);
    }

    #[test]
    fn non_sequence_features_aborts() {
        assert!(matches!(
            parse("features: 12\n"),
            Err(ParseError::ExpectedObjectOrArray)
        ));
    }

    #[test]
    fn empty_document_yields_no_flags() {
        let (flags, issues) = parse("").unwrap();
        assert!(flags.is_empty());
        assert!(issues.is_empty());
    }
}
