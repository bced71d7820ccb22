// Switchyard - Enterprise Integration Gateway
// Copyright (c) 2025 Switchyard Contributors
// Licensed under the MIT License

//! # Switchyard - Enterprise Integration Gateway
//!
//! Switchyard routes requests from internal callers to heterogeneous external
//! systems (CRMs, chat platforms, code hosts) through one uniform interface.
//!
//! ## Overview
//!
//! For every call the gateway:
//! - **Looks up** the system's configuration in the integration registry
//! - **Authenticates** with credentials decrypted from the secret store
//! - **Transforms** payloads between the canonical shape and the system's own,
//!   validating both against JSON schemas
//! - **Protects** the downstream system with a per-system circuit breaker
//! - **Reports** exactly one telemetry event per operation
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Gateway, circuit breakers, transformation and wiring
//! - [`adapters`] - Downstream system contract, adapter factory, registry, monitoring
//! - [`security`] - Master key, encrypted secret store, auth providers, webhook signatures
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use switchyard::adapters::AdapterFactory;
//! use switchyard::config::load_config;
//! use switchyard::core::context::GatewayContext;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("switchyard.toml")?;
//!     let context = GatewayContext::from_config(&config, AdapterFactory::new()).await?;
//!
//!     let contact = context
//!         .gateway()
//!         .route_request(
//!             "sf1",
//!             "get_contact",
//!             Some(json!({"_entity_type": "contact", "id": "003"})),
//!             None,
//!         )
//!         .await?;
//!
//!     println!("{contact}");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], carrying a
//! [`domain::GatewayError`]. Each variant has a stable [`kind`] code used in
//! telemetry:
//!
//! ```rust
//! use switchyard::domain::GatewayError;
//!
//! let err = GatewayError::CircuitOpen("sf1".to_string());
//! assert_eq!(err.kind(), "CIRCUIT_OPEN");
//! ```
//!
//! [`kind`]: domain::GatewayError::kind

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod security;

pub use crate::core::context::GatewayContext;
pub use crate::core::gateway::Gateway;
pub use domain::{GatewayError, Result};
