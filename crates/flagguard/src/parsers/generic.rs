//! Generic JSON dialect parser.
//!
//! Accepts either a top-level array of flag records or an object containing
//! `flags` (array, or object keyed by flag name). Records accept `name` or
//! `key`, `enabled` or `on`, the type alias set, and `dependencies` or
//! `requires` as a string or list of strings.

use serde_json::Value;

use crate::model::{Flag, FlagKind, FlagValidationError, Variation};
use crate::parsers::{ParseError, ParseIssue};

pub(crate) fn parse(content: &str) -> Result<(Vec<Flag>, Vec<ParseIssue>), ParseError> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| ParseError::Json(e.to_string()))?;

    let records: Vec<Value> = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("flags") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(flags)) => flags
                .into_iter()
                .map(|(name, mut record)| {
                    if let Some(obj) = record.as_object_mut() {
                        obj.entry("name").or_insert(Value::String(name));
                    }
                    record
                })
                .collect(),
            Some(_) => return Err(ParseError::ExpectedObjectOrArray),
            None => Vec::new(),
        },
        _ => return Err(ParseError::ExpectedObjectOrArray),
    };

    let mut flags = Vec::new();
    let mut issues = Vec::new();
    for record in &records {
        match parse_record(record) {
            Ok(flag) => flags.push(flag),
            Err(error) => issues.push(ParseIssue {
                flag: record_name(record),
                error,
            }),
        }
    }
    Ok((flags, issues))
}

fn record_name(record: &Value) -> Option<String> {
    record
        .get("name")
        .or_else(|| record.get("key"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_record(record: &Value) -> Result<Flag, ParseError> {
    let name = record_name(record).unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }

    let kind = match record.get("type").and_then(Value::as_str) {
        Some(alias) => {
            FlagKind::from_alias(&alias.to_lowercase()).ok_or_else(|| {
                ParseError::UnknownFlagKind {
                    flag: name.clone(),
                    alias: alias.to_string(),
                }
            })?
        }
        None => FlagKind::Boolean,
    };

    let enabled = record
        .get("enabled")
        .or_else(|| record.get("on"))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let variations = match record.get("variations").and_then(Value::as_array) {
        Some(raw) if !raw.is_empty() => raw
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Object(obj) => Variation::new(
                    obj.get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("var_{i}")),
                    obj.get("value").cloned().unwrap_or(Value::Null),
                ),
                scalar => Variation::new(value_name(scalar, i), scalar.clone()),
            })
            .collect(),
        _ => vec![
            Variation::new("on", Value::Bool(true)),
            Variation::new("off", Value::Bool(false)),
        ],
    };

    let default_variation = match record
        .get("default")
        .or_else(|| record.get("default_variation"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        Some(default) => {
            if variations.iter().any(|v| v.name == default) {
                default.to_string()
            } else {
                return Err(ParseError::Validation(FlagValidationError::BadDefault {
                    flag: name,
                    default_variation: default.to_string(),
                }));
            }
        }
        None => variations[0].name.clone(),
    };

    let dependencies = match record.get("dependencies").or_else(|| record.get("requires")) {
        Some(Value::String(dep)) => vec![dep.clone()],
        Some(Value::Array(deps)) => deps
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(Flag {
        name,
        kind,
        enabled,
        default_variation,
        variations,
        targeting_rules: Vec::new(),
        dependencies,
        description: record
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        tags: record
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn value_name(value: &Value, index: usize) -> String {
    match value {
        Value::Bool(true) => "on".to_string(),
        Value::Bool(false) => "off".to_string(),
        Value::String(s) => s.clone(),
        _ => format!("var_{index}"),
    }
}
