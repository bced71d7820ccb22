//! Rule engine
//!
//! A rule is applied in four fixed steps: field mappings, value
//! transformations, default values, then field removal.

use super::values::apply_value_transform;
use crate::domain::{Direction, TransformMode, TransformationRule};
use serde_json::{Map, Value};

/// Rules that apply to one entity type in one direction, in declaration order
pub fn select_rules<'a>(
    rules: &'a [TransformationRule],
    entity_type: &str,
    direction: Direction,
) -> Vec<&'a TransformationRule> {
    rules
        .iter()
        .filter(|r| r.direction == direction && r.entity_type == entity_type)
        .collect()
}

/// Applies `rules` in order, each to the output of the previous one
///
/// With no rules the input is returned unchanged.
pub fn apply_rules(rules: &[&TransformationRule], input: &Map<String, Value>) -> Map<String, Value> {
    rules
        .iter()
        .fold(input.clone(), |data, rule| apply_rule(rule, &data))
}

/// Applies a single rule
pub fn apply_rule(rule: &TransformationRule, input: &Map<String, Value>) -> Map<String, Value> {
    let mut result = match rule.mode {
        TransformMode::Selective => Map::new(),
        TransformMode::Full => input.clone(),
    };

    for (source, target) in &rule.field_mappings {
        if let Some(value) = input.get(source) {
            result.insert(target.clone(), value.clone());
        }
    }

    let fields: Vec<&String> = rule
        .value_transformations
        .keys()
        .filter(|f| result.contains_key(f.as_str()))
        .collect();
    for field in fields {
        let transform = &rule.value_transformations[field];
        let Some(current) = result.get(field.as_str()) else {
            continue;
        };

        match apply_value_transform(transform, current, &result) {
            Ok(value) => {
                result.insert(field.clone(), value);
            }
            Err(e) => tracing::warn!(
                entity_type = %rule.entity_type,
                direction = %rule.direction,
                field = %field,
                error = %e,
                "Value transformation failed, keeping original value"
            ),
        }
    }

    for (field, default) in &rule.default_values {
        let missing = result.get(field).map_or(true, Value::is_null);
        if missing {
            result.insert(field.clone(), default.clone());
        }
    }

    for field in &rule.fields_to_remove {
        result.remove(field);
    }

    result
}
