//! External collaborators of the gateway.
//!
//! - [`system`] - the [`IntegrationSystem`] contract downstream adapters implement
//! - [`factory`] - adapter construction by system type, cached per system
//! - [`registry`] - the [`IntegrationRegistry`] of system configurations
//! - [`monitoring`] - the [`MonitoringService`] telemetry sink
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern**: the gateway only sees the
//! [`IntegrationSystem`] trait, so each downstream protocol lives in its own
//! implementation and tests substitute mocks.
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::Value;
//! use switchyard::adapters::{AdapterFactory, IntegrationSystem};
//! use switchyard::domain::{Credentials, IntegrationConfig, Result};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl IntegrationSystem for Echo {
//!     async fn connect(&self) -> Result<bool> { Ok(true) }
//!     async fn disconnect(&self) -> Result<bool> { Ok(true) }
//!     async fn is_connected(&self) -> bool { true }
//!     async fn execute(&self, _op: &str, params: Value, _c: &Credentials) -> Result<Value> {
//!         Ok(params)
//!     }
//! }
//!
//! let factory = AdapterFactory::new().with_adapter("echo", |_: &IntegrationConfig| {
//!     Ok(Arc::new(Echo) as Arc<dyn IntegrationSystem>)
//! });
//! assert!(factory.supports("echo"));
//! ```

pub mod factory;
pub mod monitoring;
pub mod registry;
pub mod system;

pub use factory::{AdapterConstructor, AdapterFactory, AdapterHandle};
pub use monitoring::{
    HealthReport, MonitoringService, OperationEvent, OperationStatus, TracingMonitor, WebhookEvent,
};
pub use registry::{FileRegistry, IntegrationRegistry, SystemFilter};
pub use system::IntegrationSystem;
