//! Circuit breaker configuration

use crate::config::CircuitBreakerSettings;
use crate::domain::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds shared by every breaker in a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,

    /// Time an open circuit waits after its last failure before a trial call
    pub reset_timeout: Duration,
}

impl CircuitBreakerConfig {
    /// Config with explicit values
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
        }
    }

    /// Rejects zero thresholds and zero timeouts
    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(GatewayError::Configuration(
                "failure_threshold must be greater than 0".to_string(),
            ));
        }
        if self.reset_timeout.is_zero() {
            return Err(GatewayError::Configuration(
                "reset_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold,
            reset_timeout: settings.reset_timeout(),
        }
    }
}
