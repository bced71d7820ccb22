//! Per-field value transformations

use crate::domain::ValueTransform;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").ok())
        .as_ref()
}

/// Applies `transform` to `value`
///
/// `record` is the object the field lives in, used by `format` placeholders.
/// An `Err` describes why the field could not be transformed; callers keep the
/// original value in that case.
pub fn apply_value_transform(
    transform: &ValueTransform,
    value: &Value,
    record: &Map<String, Value>,
) -> Result<Value, String> {
    match transform {
        ValueTransform::Map { mapping, default } => Ok(mapping
            .get(&display(value))
            .or(default.as_ref())
            .cloned()
            .unwrap_or_else(|| value.clone())),

        ValueTransform::Format { template } => format_template(template, value, record),

        ValueTransform::Split { delimiter, index } => {
            let Value::String(s) = value else {
                return Err(format!("split expects a string, got {}", type_name(value)));
            };
            if delimiter.is_empty() {
                return Err("split delimiter is empty".to_string());
            }
            s.split(delimiter.as_str())
                .nth(*index)
                .map(|part| Value::String(part.to_string()))
                .ok_or_else(|| format!("split index {index} out of range"))
        }

        ValueTransform::Join { delimiter } => match value {
            Value::Array(items) => Ok(Value::String(
                items.iter().map(display).collect::<Vec<_>>().join(delimiter),
            )),
            other => Err(format!("join expects an array, got {}", type_name(other))),
        },

        ValueTransform::Boolean { true_values } => Ok(Value::Bool(match value {
            Value::Bool(b) => *b,
            Value::Null => false,
            other => {
                let token = display(other);
                true_values
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(token.trim()))
            }
        })),

        ValueTransform::Number => Ok(Value::Number(to_number(value))),

        ValueTransform::String => Ok(match value {
            Value::String(_) => value.clone(),
            Value::Null => Value::String(String::new()),
            other => Value::String(other.to_string()),
        }),
    }
}

fn format_template(
    template: &str,
    value: &Value,
    record: &Map<String, Value>,
) -> Result<Value, String> {
    let Some(pattern) = placeholder_pattern() else {
        return Err("template placeholder pattern failed to compile".to_string());
    };

    let mut missing = None;
    let rendered = pattern.replace_all(template, |caps: &regex::Captures| {
        let name = &caps[1];
        if name == "value" {
            return display(value);
        }
        match record.get(name) {
            Some(v) => display(v),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(format!("unknown placeholder '{{{name}}}' in template")),
        None => Ok(Value::String(rendered.into_owned())),
    }
}

fn to_number(value: &Value) -> Number {
    match value {
        Value::Number(n) => n.clone(),
        Value::Bool(b) => Number::from(u8::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Number::from(i)
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .unwrap_or_else(|| Number::from(0))
            }
        }
        _ => Number::from(0),
    }
}

/// Text form used for lookups and templates; strings are not quoted
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
