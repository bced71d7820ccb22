//! Data transformation pipeline
//!
//! Payloads travel between a canonical (internal) shape and each downstream
//! system's (external) shape:
//!
//! - [`schema`] - internal and external JSON schemas, [`CanonicalDataModel`]
//! - [`rules`] - the rule engine (mappings, value transforms, defaults, removals)
//! - [`values`] - individual value transformations
//! - [`transformer`] - per-system [`DataTransformer`] and its cache
//!
//! # Example
//!
//! ```
//! use switchyard::core::transform::TransformerFactory;
//! use switchyard::domain::{Direction, IntegrationConfig, TransformMode, TransformationRule};
//! use serde_json::json;
//!
//! let config = IntegrationConfig::new("sf1", "salesforce", "Salesforce").with_rule(
//!     TransformationRule::new("contact", Direction::Outbound)
//!         .with_mode(TransformMode::Selective)
//!         .map_field("firstName", "first_name"),
//! );
//!
//! let factory = TransformerFactory::default();
//! let transformer = factory.get_transformer(&config).unwrap();
//! let out = transformer
//!     .transform_to_external(&json!({"_entity_type": "contact", "firstName": "Ann", "age": 5}))
//!     .unwrap();
//! assert_eq!(out, json!({"first_name": "Ann"}));
//! ```

pub mod rules;
pub mod schema;
pub mod transformer;
pub mod values;

pub use schema::{CanonicalDataModel, CompiledSchema, SchemaRegistry};
pub use transformer::{
    entity_type_of, DataTransformer, TransformerFactory, DEFAULT_ENTITY_TYPE, ENTITY_TYPE_FIELD,
    METADATA_FIELD,
};
