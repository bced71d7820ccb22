//! Per-system circuit breaking
//!
//! Each downstream system gets exactly one [`CircuitBreaker`], created lazily
//! through [`CircuitBreakerRegistry::get_or_create`].

pub mod circuit;
pub mod config;
pub mod registry;
pub mod state;

pub use circuit::{CircuitBreaker, CircuitBreakerStats};
pub use config::CircuitBreakerConfig;
pub use registry::{CircuitBreakerRegistry, RegistryHealth};
pub use state::{CircuitState, StateTransition};
