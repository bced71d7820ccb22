//! Core gateway logic for Switchyard.
//!
//! # Modules
//!
//! - [`gateway`] - Request routing, batch execution, webhooks and health checks
//! - [`breaker`] - Per-system circuit breakers
//! - [`transform`] - Schema-validated, rule-driven payload transformation
//! - [`context`] - Builds the wired gateway from configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use switchyard::adapters::AdapterFactory;
//! use switchyard::config::load_config;
//! use switchyard::core::context::GatewayContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("switchyard.toml")?;
//! let context = GatewayContext::from_config(&config, AdapterFactory::new()).await?;
//!
//! let contacts = context
//!     .gateway()
//!     .route_request("sf1", "query", None, None)
//!     .await?;
//! println!("{contacts}");
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod context;
pub mod gateway;
pub mod transform;
