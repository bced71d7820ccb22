//! Transformation rule definitions
//!
//! Rules are loaded immutably from `IntegrationConfig.transform_params` and
//! describe how a payload for one entity type is reshaped in one direction.
//! The engine that applies them lives in [`crate::core::transform::rules`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Direction a payload travels through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Downstream system -> canonical shape
    Inbound,
    /// Canonical shape -> downstream system
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

/// Whether a rule starts from an empty object or a copy of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Only mapped and defaulted fields survive
    Selective,
    /// Start from a full copy of the input
    #[default]
    Full,
}

/// Per-field value transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueTransform {
    /// Dictionary lookup; unmatched values fall back to `default` when given
    Map {
        mapping: Map<String, Value>,
        #[serde(default)]
        default: Option<Value>,
    },
    /// String template; `{value}` is the field value, `{name}` any other field
    Format { template: String },
    /// Split a string and keep the part at `index`
    Split {
        delimiter: String,
        #[serde(default)]
        index: usize,
    },
    /// Join an array into a string
    Join { delimiter: String },
    /// Case-insensitive truthy-token check
    Boolean {
        #[serde(default = "default_true_values")]
        true_values: Vec<String>,
    },
    /// Numeric cast, 0 when the value does not parse
    Number,
    /// String cast
    String,
}

fn default_true_values() -> Vec<String> {
    ["true", "yes", "y", "1", "on"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Reshaping rule for one entity type and direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    /// Entity type the rule applies to
    pub entity_type: String,

    /// Direction the rule applies to
    pub direction: Direction,

    /// Starting shape of the result
    #[serde(default)]
    pub mode: TransformMode,

    /// `source_field -> target_field` copies
    #[serde(default)]
    pub field_mappings: HashMap<String, String>,

    /// Transformations applied to fields present in the result
    #[serde(default)]
    pub value_transformations: HashMap<String, ValueTransform>,

    /// Values for fields still missing or null
    #[serde(default)]
    pub default_values: Map<String, Value>,

    /// Fields deleted last
    #[serde(default)]
    pub fields_to_remove: Vec<String>,
}

impl TransformationRule {
    /// Creates an empty rule
    pub fn new(entity_type: impl Into<String>, direction: Direction) -> Self {
        Self {
            entity_type: entity_type.into(),
            direction,
            mode: TransformMode::default(),
            field_mappings: HashMap::new(),
            value_transformations: HashMap::new(),
            default_values: Map::new(),
            fields_to_remove: Vec::new(),
        }
    }

    /// Sets the mode
    pub fn with_mode(mut self, mode: TransformMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds a field mapping
    pub fn map_field(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.field_mappings.insert(source.into(), target.into());
        self
    }

    /// Adds a value transformation
    pub fn transform_value(mut self, field: impl Into<String>, transform: ValueTransform) -> Self {
        self.value_transformations.insert(field.into(), transform);
        self
    }

    /// Adds a default value
    pub fn default_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.default_values.insert(field.into(), value);
        self
    }

    /// Adds a field to remove
    pub fn remove_field(mut self, field: impl Into<String>) -> Self {
        self.fields_to_remove.push(field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_deserialize_with_defaults() {
        let rule: TransformationRule = serde_json::from_value(json!({
            "entity_type": "contact",
            "direction": "outbound",
            "field_mappings": {"firstName": "first_name"}
        }))
        .unwrap();

        assert_eq!(rule.mode, TransformMode::Full);
        assert_eq!(rule.direction, Direction::Outbound);
        assert_eq!(rule.field_mappings["firstName"], "first_name");
        assert!(rule.value_transformations.is_empty());
    }

    #[test]
    fn test_value_transform_tagged() {
        let transform: ValueTransform = serde_json::from_value(json!({
            "type": "split",
            "delimiter": " ",
            "index": 1
        }))
        .unwrap();
        assert_eq!(
            transform,
            ValueTransform::Split {
                delimiter: " ".to_string(),
                index: 1
            }
        );

        let boolean: ValueTransform = serde_json::from_value(json!({"type": "boolean"})).unwrap();
        match boolean {
            ValueTransform::Boolean { true_values } => assert!(true_values.contains(&"yes".to_string())),
            other => panic!("unexpected transform: {other:?}"),
        }
    }

    #[test]
    fn test_rule_builder() {
        let rule = TransformationRule::new("contact", Direction::Inbound)
            .with_mode(TransformMode::Selective)
            .map_field("first_name", "firstName")
            .default_value("status", json!("active"))
            .remove_field("internal_id");

        assert_eq!(rule.mode, TransformMode::Selective);
        assert_eq!(rule.field_mappings.len(), 1);
        assert_eq!(rule.default_values["status"], "active");
        assert_eq!(rule.fields_to_remove, vec!["internal_id".to_string()]);
    }
}
