//! Domain error types
//!
//! This module defines the error hierarchy for Switchyard. Every fallible
//! gateway, security and transformation operation reports one of these kinds;
//! third-party error types never cross the crate boundary.

use thiserror::Error;

/// Main Switchyard error type
///
/// Downstream failures arrive as [`GatewayError::Adapter`] and are passed
/// back to the caller unchanged after being logged.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A referenced system, secret or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The system does not support the requested operation
    #[error("Operation '{operation}' is not supported by system '{system_id}'")]
    UnsupportedOperation {
        /// System the call targeted
        system_id: String,
        /// Operation that was rejected
        operation: String,
    },

    /// No adapter constructor is registered for the system type
    #[error("Unsupported system type: {0}")]
    UnsupportedSystemType(String),

    /// Payload did not match the registered JSON schema
    #[error("Schema validation failed for entity '{entity_type}': {}", .errors.join("; "))]
    SchemaValidation {
        /// Entity type whose schema was applied
        entity_type: String,
        /// Individual validation messages
        errors: Vec<String>,
    },

    /// Payload could not be reshaped
    #[error("Transformation error: {0}")]
    Transformation(String),

    /// The circuit breaker for the system is rejecting calls
    #[error("Circuit breaker is open for system '{0}'")]
    CircuitOpen(String),

    /// A stored secret could not be decrypted (tampering or wrong key)
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Authentication provider configuration or token exchange failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Downstream adapter or transport failure
    #[error("Adapter error ({system_id}): {message}")]
    Adapter {
        /// System whose adapter failed
        system_id: String,
        /// Error reported by the adapter
        message: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Secret store or registry persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl GatewayError {
    /// Creates an adapter error for a system
    pub fn adapter(system_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            system_id: system_id.into(),
            message: message.into(),
        }
    }

    /// Stable error code used in telemetry events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            Self::UnsupportedSystemType(_) => "UNSUPPORTED_SYSTEM_TYPE",
            Self::SchemaValidation { .. } => "SCHEMA_VALIDATION",
            Self::Transformation(_) => "TRANSFORMATION",
            Self::CircuitOpen(_) => "CIRCUIT_OPEN",
            Self::Decryption(_) => "DECRYPTION",
            Self::Auth(_) => "AUTH",
            Self::Adapter { .. } => "ADAPTER",
            Self::Configuration(_) => "CONFIGURATION",
            Self::Storage(_) => "STORAGE",
            Self::Validation(_) => "VALIDATION",
            Self::Serialization(_) => "SERIALIZATION",
            Self::Io(_) => "IO",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::Configuration(format!("TOML parse error: {err}"))
    }
}
