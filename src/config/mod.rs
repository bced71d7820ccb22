//! Configuration management for Switchyard.
//!
//! Switchyard reads a single TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SWITCHYARD_<SECTION>_<KEY>` overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use switchyard::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("switchyard.toml")?;
//!
//! println!("Registry: {}", config.registry.path);
//! println!("Breaker threshold: {}", config.circuit_breaker.failure_threshold);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SecurityConfig`] - Master key and encrypted secret store
//! - [`RegistryConfig`] - Integration registry file
//! - [`SchemasConfig`] - JSON schema directory
//! - [`CircuitBreakerSettings`] - Breaker threshold and reset timeout
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [security]
//! master_key = "${SWITCHYARD_MASTER_KEY}"
//! secrets_path = "/var/lib/switchyard/secrets.json"
//!
//! [registry]
//! path = "/etc/switchyard/registry.json"
//!
//! [circuit_breaker]
//! failure_threshold = 5
//! reset_timeout_seconds = 60
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CircuitBreakerSettings, LoggingConfig, RegistryConfig, SchemasConfig,
    SecurityConfig, SwitchyardConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
