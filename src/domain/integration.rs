//! Integration configuration model
//!
//! An [`IntegrationConfig`] describes one downstream system. It is owned by the
//! integration registry; the gateway and the factories only read it.

use super::rules::TransformationRule;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Capability flags and webhook settings of a system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetadata {
    /// Adapter accepts `batch_<operation>` calls
    #[serde(default)]
    pub supports_batch: bool,

    /// System can deliver webhooks
    #[serde(default)]
    pub supports_webhooks: bool,

    /// Header carrying the webhook signature, if the system uses a custom one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_signature_header: Option<String>,

    /// HMAC algorithm of the webhook signature (`sha256` when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_signature_algorithm: Option<String>,

    /// Free-form metadata
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Data-transformation settings of a system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Rules for this system
    #[serde(default)]
    pub rules: Vec<TransformationRule>,

    /// External JSON schemas keyed by entity type
    #[serde(default)]
    pub external_schemas: HashMap<String, Value>,
}

/// Configuration of one downstream system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Unique system identifier
    pub system_id: String,

    /// Adapter kind (`salesforce`, `slack`, `sap`, ...)
    pub system_type: String,

    /// Human-readable name
    pub name: String,

    /// Adapter connection parameters
    #[serde(default)]
    pub connection_params: Map<String, Value>,

    /// Non-secret authentication parameters; `type` selects the provider
    #[serde(default)]
    pub auth_params: Map<String, Value>,

    /// Transformation rules and external schemas
    #[serde(default)]
    pub transform_params: TransformParams,

    /// Disabled systems reject all calls
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Capabilities and free-form metadata
    #[serde(default)]
    pub metadata: SystemMetadata,
}

fn default_enabled() -> bool {
    true
}

impl IntegrationConfig {
    /// Creates an enabled configuration with empty parameters
    pub fn new(
        system_id: impl Into<String>,
        system_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            system_type: system_type.into(),
            name: name.into(),
            connection_params: Map::new(),
            auth_params: Map::new(),
            transform_params: TransformParams::default(),
            enabled: true,
            metadata: SystemMetadata::default(),
        }
    }

    /// Authentication type tag from `auth_params.type`, if set
    pub fn auth_type(&self) -> Option<&str> {
        self.auth_params.get("type").and_then(Value::as_str)
    }

    /// Sets an authentication parameter
    pub fn with_auth_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.auth_params.insert(key.into(), value);
        self
    }

    /// Sets a connection parameter
    pub fn with_connection_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.connection_params.insert(key.into(), value);
        self
    }

    /// Adds a transformation rule
    pub fn with_rule(mut self, rule: TransformationRule) -> Self {
        self.transform_params.rules.push(rule);
        self
    }

    /// Registers an external schema for an entity type
    pub fn with_external_schema(mut self, entity_type: impl Into<String>, schema: Value) -> Self {
        self.transform_params
            .external_schemas
            .insert(entity_type.into(), schema);
        self
    }

    /// Replaces the metadata
    pub fn with_metadata(mut self, metadata: SystemMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Checks the configuration for obviously invalid values
    pub fn validate(&self) -> Result<(), String> {
        if self.system_id.trim().is_empty() {
            return Err("system_id cannot be empty".to_string());
        }
        if self.system_id.contains(':') {
            return Err(format!(
                "system_id '{}' may not contain ':'",
                self.system_id
            ));
        }
        if self.system_type.trim().is_empty() {
            return Err(format!("system '{}' has an empty system_type", self.system_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: IntegrationConfig = serde_json::from_value(json!({
            "system_id": "sf1",
            "system_type": "salesforce",
            "name": "Salesforce EU"
        }))
        .unwrap();

        assert!(config.enabled);
        assert!(!config.metadata.supports_batch);
        assert!(config.auth_type().is_none());
        assert!(config.transform_params.rules.is_empty());
    }

    #[test]
    fn test_metadata_keeps_extra_fields() {
        let metadata: SystemMetadata = serde_json::from_value(json!({
            "supports_webhooks": true,
            "region": "eu-west-1"
        }))
        .unwrap();

        assert!(metadata.supports_webhooks);
        assert_eq!(metadata.extra["region"], "eu-west-1");
    }

    #[test]
    fn test_auth_type() {
        let config = IntegrationConfig::new("s1", "slack", "Slack")
            .with_auth_param("type", json!("api_key"));
        assert_eq!(config.auth_type(), Some("api_key"));
    }

    #[test]
    fn test_validate() {
        assert!(IntegrationConfig::new("s1", "slack", "Slack").validate().is_ok());
        assert!(IntegrationConfig::new("", "slack", "Slack").validate().is_err());
        assert!(IntegrationConfig::new("s:1", "slack", "Slack").validate().is_err());
        assert!(IntegrationConfig::new("s1", " ", "Slack").validate().is_err());
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let config = IntegrationConfig::new("sf1", "salesforce", "Salesforce")
            .with_connection_param("instance_url", json!("https://example.my.salesforce.com"))
            .with_external_schema("contact", json!({"type": "object"}));

        let json = serde_json::to_string(&config).unwrap();
        let back: IntegrationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
