//! Bidirectional per-system transformers

use super::rules::{apply_rules, select_rules};
use super::schema::{CanonicalDataModel, CompiledSchema};
use crate::domain::{Direction, GatewayError, IntegrationConfig, Result, TransformationRule};
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Field naming the entity type of a payload
pub const ENTITY_TYPE_FIELD: &str = "_entity_type";

/// Field holding provenance stamped on inbound payloads
pub const METADATA_FIELD: &str = "_metadata";

/// Entity type assumed when a payload does not name one
pub const DEFAULT_ENTITY_TYPE: &str = "default";

/// Reshapes payloads between the canonical shape and one system's shape
#[derive(Debug)]
pub struct DataTransformer {
    system_id: String,
    system_type: String,
    rules: Vec<TransformationRule>,
    external_schemas: HashMap<String, Arc<CompiledSchema>>,
    model: CanonicalDataModel,
}

impl DataTransformer {
    /// Compiles the system's own external schemas
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] when one of them is not a valid schema.
    pub fn new(config: &IntegrationConfig, model: CanonicalDataModel) -> Result<Self> {
        let external_schemas = config
            .transform_params
            .external_schemas
            .iter()
            .map(|(entity_type, schema)| {
                Ok((entity_type.clone(), Arc::new(CompiledSchema::compile(schema.clone())?)))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self {
            system_id: config.system_id.clone(),
            system_type: config.system_type.clone(),
            rules: config.transform_params.rules.clone(),
            external_schemas,
            model,
        })
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Canonical -> system shape
    ///
    /// # Errors
    ///
    /// [`GatewayError::SchemaValidation`] when the input does not match the
    /// internal schema or the result does not match the system's external
    /// schema.
    pub fn transform_to_external(&self, data: &Value) -> Result<Value> {
        let entity_type = entity_type_of(data);
        self.model.validate(data, &entity_type)?;

        let result = self.apply(data, &entity_type, Direction::Outbound);

        if let Some(schema) = self.external_schema(&entity_type) {
            let errors = schema.errors(&result);
            if !errors.is_empty() {
                return Err(GatewayError::SchemaValidation {
                    entity_type,
                    errors,
                });
            }
        }

        Ok(result)
    }

    /// System -> canonical shape, stamped with provenance
    ///
    /// A mismatch against the external schema is logged and ignored; the
    /// result must still match the internal schema.
    pub fn transform_to_internal(&self, data: &Value) -> Result<Value> {
        let entity_type = entity_type_of(data);

        if let Some(schema) = self.external_schema(&entity_type) {
            let errors = schema.errors(data);
            if !errors.is_empty() {
                tracing::warn!(
                    system_id = %self.system_id,
                    entity_type = %entity_type,
                    errors = %errors.join("; "),
                    "Inbound payload does not match external schema"
                );
            }
        }

        let mut result = self.apply(data, &entity_type, Direction::Inbound);
        if let Value::Object(map) = &mut result {
            self.stamp_provenance(map, &entity_type);
        }

        self.model.validate(&result, &entity_type)?;
        Ok(result)
    }

    /// Inbound transform of an adapter result; arrays are transformed per element
    pub fn transform_result(&self, data: &Value) -> Result<Value> {
        match data {
            Value::Array(items) => items
                .iter()
                .map(|item| self.transform_result(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(_) => self.transform_to_internal(data),
            other => Ok(other.clone()),
        }
    }

    /// The system's own schema for `entity_type`, else the one shared by its type
    fn external_schema(&self, entity_type: &str) -> Option<Arc<CompiledSchema>> {
        self.external_schemas
            .get(entity_type)
            .cloned()
            .or_else(|| self.model.registry().external(&self.system_type, entity_type))
    }

    fn apply(&self, data: &Value, entity_type: &str, direction: Direction) -> Value {
        let Value::Object(input) = data else {
            return data.clone();
        };

        let rules = select_rules(&self.rules, entity_type, direction);
        if rules.is_empty() {
            tracing::trace!(
                system_id = %self.system_id,
                entity_type = %entity_type,
                direction = %direction,
                "No transformation rules"
            );
        }
        Value::Object(apply_rules(&rules, input))
    }

    fn stamp_provenance(&self, map: &mut Map<String, Value>, entity_type: &str) {
        let metadata = map
            .entry(METADATA_FIELD)
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(metadata) = metadata {
            metadata.insert("source_system".to_string(), Value::String(self.system_id.clone()));
            metadata.insert(
                "source_system_type".to_string(),
                Value::String(self.system_type.clone()),
            );
        }
        map.insert(
            ENTITY_TYPE_FIELD.to_string(),
            Value::String(entity_type.to_string()),
        );
    }
}

/// Entity type named by the payload, or [`DEFAULT_ENTITY_TYPE`]
pub fn entity_type_of(data: &Value) -> String {
    data.get(ENTITY_TYPE_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ENTITY_TYPE)
        .to_string()
}

/// One cached transformer per system
#[derive(Debug, Default)]
pub struct TransformerFactory {
    model: CanonicalDataModel,
    transformers: DashMap<String, Arc<DataTransformer>>,
}

impl TransformerFactory {
    pub fn new(model: CanonicalDataModel) -> Self {
        Self {
            model,
            transformers: DashMap::new(),
        }
    }

    pub fn model(&self) -> &CanonicalDataModel {
        &self.model
    }

    /// The transformer for `config.system_id`, built on first use
    pub fn get_transformer(&self, config: &IntegrationConfig) -> Result<Arc<DataTransformer>> {
        if let Some(existing) = self.transformers.get(&config.system_id) {
            return Ok(Arc::clone(existing.value()));
        }

        let transformer = Arc::new(DataTransformer::new(config, self.model.clone())?);
        tracing::debug!(
            system_id = %config.system_id,
            rules = config.transform_params.rules.len(),
            "Created transformer"
        );

        Ok(self
            .transformers
            .entry(config.system_id.clone())
            .or_insert(transformer)
            .clone())
    }

    /// Drops the cached transformer so the next call picks up new rules
    pub fn evict(&self, system_id: &str) -> bool {
        self.transformers.remove(system_id).is_some()
    }
}
