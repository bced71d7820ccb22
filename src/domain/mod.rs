//! Domain models and types for Switchyard.
//!
//! This module contains the data model shared by the gateway, the security
//! layer and the transformation pipeline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Integration configuration** ([`IntegrationConfig`], [`SystemMetadata`])
//! - **Transformation rules** ([`TransformationRule`], [`ValueTransform`])
//! - **Credentials** ([`Credentials`], [`AuthType`])
//! - **Identifiers** ([`SecretKey`], [`RequestId`]) and [`RequestContext`]
//! - **Error types** ([`GatewayError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, GatewayError>`]:
//!
//! ```rust
//! use switchyard::domain::{GatewayError, Result};
//!
//! fn lookup(system_id: &str) -> Result<()> {
//!     Err(GatewayError::NotFound(format!("Integration system '{system_id}'")))
//! }
//! ```

pub mod credentials;
pub mod errors;
pub mod ids;
pub mod integration;
pub mod request;
pub mod result;
pub mod rules;

// Re-export commonly used types for convenience
pub use credentials::{AuthType, Credentials};
pub use errors::GatewayError;
pub use ids::{RequestId, SecretKey, AUTH_CATEGORY, WEBHOOK_CATEGORY};
pub use integration::{IntegrationConfig, SystemMetadata, TransformParams};
pub use request::RequestContext;
pub use result::Result;
pub use rules::{Direction, TransformMode, TransformationRule, ValueTransform};
