//! JSON schemas for canonical and system-specific payloads
//!
//! Internal schemas describe the canonical shape of an entity type and apply
//! to every system. External schemas describe what one system type expects
//! for an entity type.

use crate::domain::{GatewayError, Result};
use jsonschema::Validator;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A schema together with its compiled validator
pub struct CompiledSchema {
    schema: Value,
    validator: Validator,
}

impl CompiledSchema {
    /// Compiles `schema`
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] when the schema itself is invalid.
    pub fn compile(schema: Value) -> Result<Self> {
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| GatewayError::Configuration(format!("Invalid JSON schema: {e}")))?;
        Ok(Self { schema, validator })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validation messages for `data`; empty when it conforms
    pub fn errors(&self, data: &Value) -> Vec<String> {
        self.validator
            .iter_errors(data)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

type ExternalKey = (String, String);

/// Registered internal and external schemas
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    internal: RwLock<HashMap<String, Arc<CompiledSchema>>>,
    external: RwLock<HashMap<ExternalKey, Arc<CompiledSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the canonical schema of `entity_type`, replacing any previous one
    pub fn register_internal(&self, entity_type: &str, schema: Value) -> Result<()> {
        let compiled = Arc::new(CompiledSchema::compile(schema)?);
        self.internal.write().insert(entity_type.to_string(), compiled);
        tracing::debug!(entity_type = %entity_type, "Registered internal schema");
        Ok(())
    }

    /// Registers what `system_type` expects for `entity_type`
    pub fn register_external(&self, system_type: &str, entity_type: &str, schema: Value) -> Result<()> {
        let compiled = Arc::new(CompiledSchema::compile(schema)?);
        self.external
            .write()
            .insert(external_key(system_type, entity_type), compiled);
        tracing::debug!(
            system_type = %system_type,
            entity_type = %entity_type,
            "Registered external schema"
        );
        Ok(())
    }

    pub fn internal(&self, entity_type: &str) -> Option<Arc<CompiledSchema>> {
        self.internal.read().get(entity_type).cloned()
    }

    pub fn external(&self, system_type: &str, entity_type: &str) -> Option<Arc<CompiledSchema>> {
        self.external
            .read()
            .get(&external_key(system_type, entity_type))
            .cloned()
    }

    /// Entity types with an internal schema, sorted
    pub fn internal_entity_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.internal.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Loads `internal/<entity>.json` and `external/<system_type>/<entity>.json`
    ///
    /// Returns the number of schemas registered. Missing subdirectories are
    /// skipped.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let mut loaded = 0;

        for (entity_type, schema) in read_schema_files(&dir.join("internal"))? {
            self.register_internal(&entity_type, schema)?;
            loaded += 1;
        }

        let external_dir = dir.join("external");
        if external_dir.is_dir() {
            for entry in std::fs::read_dir(&external_dir)? {
                let path = entry?.path();
                if !path.is_dir() {
                    continue;
                }
                let Some(system_type) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                for (entity_type, schema) in read_schema_files(&path)? {
                    self.register_external(system_type, &entity_type, schema)?;
                    loaded += 1;
                }
            }
        }

        tracing::info!(directory = %dir.display(), schemas = loaded, "Schemas loaded");
        Ok(loaded)
    }
}

fn external_key(system_type: &str, entity_type: &str) -> ExternalKey {
    (system_type.to_lowercase(), entity_type.to_string())
}

fn read_schema_files(dir: &Path) -> Result<Vec<(String, Value)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut schemas = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(entity_type) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let contents = std::fs::read_to_string(&path)?;
        let schema: Value = serde_json::from_str(&contents).map_err(|e| {
            GatewayError::Configuration(format!("Schema file {} is invalid: {e}", path.display()))
        })?;
        schemas.push((entity_type.to_string(), schema));
    }
    Ok(schemas)
}

/// Validates payloads against the canonical schemas
#[derive(Debug, Clone, Default)]
pub struct CanonicalDataModel {
    registry: Arc<SchemaRegistry>,
}

impl CanonicalDataModel {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Validates `data` against the internal schema of `entity_type`
    ///
    /// Entity types without a schema pass.
    ///
    /// # Errors
    ///
    /// [`GatewayError::SchemaValidation`] listing every violation.
    pub fn validate(&self, data: &Value, entity_type: &str) -> Result<()> {
        let Some(schema) = self.registry.internal(entity_type) else {
            tracing::debug!(entity_type = %entity_type, "No internal schema registered, skipping validation");
            return Ok(());
        };

        let errors = schema.errors(data);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::SchemaValidation {
                entity_type: entity_type.to_string(),
                errors,
            })
        }
    }
}
