//! Configuration schema types
//!
//! This module defines the configuration structure for Switchyard.

use crate::config::SecretString;
use crate::domain::AuthType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Main Switchyard configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SwitchyardConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Master key and secret store settings
    #[serde(default)]
    pub security: SecurityConfig,

    /// Integration registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// JSON schema locations
    #[serde(default)]
    pub schemas: SchemasConfig,

    /// Circuit breaker defaults applied to every system
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SwitchyardConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.security.validate()?;
        self.registry.validate()?;
        self.circuit_breaker.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Master key and secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// File holding the base64 master key (generated when missing)
    #[serde(default = "default_master_key_path")]
    pub master_key_path: String,

    /// Inline master key; takes precedence over `master_key_path`
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub master_key: Option<SecretString>,

    /// Encrypted secret file
    #[serde(default = "default_secrets_path")]
    pub secrets_path: String,

    /// Provider used when a system's `auth_params.type` is unset
    #[serde(default = "default_auth_type")]
    pub default_auth_type: String,
}

impl SecurityConfig {
    fn validate(&self) -> Result<(), String> {
        if self.master_key.is_none() && self.master_key_path.trim().is_empty() {
            return Err(
                "security.master_key_path cannot be empty when no inline master_key is set"
                    .to_string(),
            );
        }

        if self.secrets_path.trim().is_empty() {
            return Err("security.secrets_path cannot be empty".to_string());
        }

        AuthType::from_str(&self.default_auth_type)
            .map_err(|e| format!("Invalid security.default_auth_type: {e}"))?;

        Ok(())
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            master_key_path: default_master_key_path(),
            master_key: None,
            secrets_path: default_secrets_path(),
            default_auth_type: default_auth_type(),
        }
    }
}

/// Integration registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// JSON file mapping system ids to integration configs
    #[serde(default = "default_registry_path")]
    pub path: String,
}

impl RegistryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("registry.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

/// JSON schema locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Directory with `internal/<entity>.json` and
    /// `external/<system_type>/<entity>.json`
    #[serde(default)]
    pub directory: Option<String>,
}

/// Circuit breaker defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds an open circuit waits before allowing a trial call
    #[serde(default = "default_reset_timeout_seconds")]
    pub reset_timeout_seconds: u64,
}

impl CircuitBreakerSettings {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("circuit_breaker.failure_threshold must be > 0".to_string());
        }
        if self.reset_timeout_seconds == 0 {
            return Err("circuit_breaker.reset_timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }

    /// Reset timeout as a duration
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_seconds)
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_seconds: default_reset_timeout_seconds(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_master_key_path() -> String {
    ".switchyard/master.key".to_string()
}

fn default_secrets_path() -> String {
    ".switchyard/secrets.json".to_string()
}

fn default_auth_type() -> String {
    "oauth2".to_string()
}

fn default_registry_path() -> String {
    ".switchyard/registry.json".to_string()
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_seconds() -> u64 {
    60
}

fn default_local_path() -> String {
    "/var/log/switchyard".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_default_config_is_valid() {
        let config = SwitchyardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.reset_timeout(), Duration::from_secs(60));
        assert_eq!(config.security.default_auth_type, "oauth2");
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_security_config_validation() {
        let mut config = SecurityConfig::default();
        assert!(config.validate().is_ok());

        config.default_auth_type = "kerberos".to_string();
        assert!(config.validate().is_err());

        config.default_auth_type = "api_key".to_string();
        config.master_key_path = String::new();
        assert!(config.validate().is_err());

        config.master_key = Some(secret_string("bWFzdGVy".to_string()));
        assert!(config.validate().is_ok());

        config.secrets_path = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_circuit_breaker_settings_validation() {
        let mut settings = CircuitBreakerSettings::default();
        assert!(settings.validate().is_ok());

        settings.failure_threshold = 0;
        assert!(settings.validate().is_err());

        settings.failure_threshold = 3;
        settings.reset_timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());

        config.local_rotation = "hourly".to_string();
        config.local_enabled = true;
        config.local_path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml_uses_defaults() {
        let config: SwitchyardConfig = toml::from_str(
            r#"
[circuit_breaker]
failure_threshold = 3
"#,
        )
        .unwrap();

        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.reset_timeout_seconds, 60);
        assert_eq!(config.registry.path, ".switchyard/registry.json");
        assert!(config.schemas.directory.is_none());
    }
}
