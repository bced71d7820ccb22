//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SwitchyardConfig;
use super::secret::secret_string;
use crate::domain::errors::GatewayError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Substitutes `${VAR}` placeholders from the environment
/// 3. Parses the TOML into [`SwitchyardConfig`]
/// 4. Applies `SWITCHYARD_<SECTION>_<KEY>` overrides
/// 5. Validates the result
///
/// # Errors
///
/// Returns [`GatewayError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// rejects a value.
///
/// # Examples
///
/// ```no_run
/// use switchyard::config::loader::load_config;
///
/// let config = load_config("switchyard.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SwitchyardConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GatewayError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        GatewayError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: SwitchyardConfig = toml::from_str(&contents)
        .map_err(|e| GatewayError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        GatewayError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Replaces `${VAR_NAME}` placeholders with environment values
///
/// Comment lines are copied untouched. Every missing variable is reported in
/// a single error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| GatewayError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }

            re.replace_all(line, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                })
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(GatewayError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    let mut result = lines.join("\n");
    result.push('\n');
    Ok(result)
}

/// Applies `SWITCHYARD_<SECTION>_<KEY>` environment overrides
///
/// Unparseable numeric and boolean values are ignored so the file value
/// stays in effect.
fn apply_env_overrides(config: &mut SwitchyardConfig) {
    if let Ok(val) = std::env::var("SWITCHYARD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Security
    if let Ok(val) = std::env::var("SWITCHYARD_SECURITY_MASTER_KEY") {
        config.security.master_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("SWITCHYARD_SECURITY_MASTER_KEY_PATH") {
        config.security.master_key_path = val;
    }
    if let Ok(val) = std::env::var("SWITCHYARD_SECURITY_SECRETS_PATH") {
        config.security.secrets_path = val;
    }
    if let Ok(val) = std::env::var("SWITCHYARD_SECURITY_DEFAULT_AUTH_TYPE") {
        config.security.default_auth_type = val;
    }

    if let Ok(val) = std::env::var("SWITCHYARD_REGISTRY_PATH") {
        config.registry.path = val;
    }
    if let Ok(val) = std::env::var("SWITCHYARD_SCHEMAS_DIRECTORY") {
        config.schemas.directory = Some(val);
    }

    // Circuit breaker
    if let Ok(val) = std::env::var("SWITCHYARD_CIRCUIT_BREAKER_FAILURE_THRESHOLD") {
        if let Ok(threshold) = val.parse() {
            config.circuit_breaker.failure_threshold = threshold;
        }
    }
    if let Ok(val) = std::env::var("SWITCHYARD_CIRCUIT_BREAKER_RESET_TIMEOUT_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.circuit_breaker.reset_timeout_seconds = seconds;
        }
    }

    // Logging
    if let Ok(val) = std::env::var("SWITCHYARD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SWITCHYARD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("SWITCHYARD_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("SWITCHYARD_LOADER_TEST_VAR", "test_value");
        let input = "master_key = \"${SWITCHYARD_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "master_key = \"test_value\"\n");
        std::env::remove_var("SWITCHYARD_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("SWITCHYARD_LOADER_MISSING_VAR");
        let input = "master_key = \"${SWITCHYARD_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("SWITCHYARD_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("SWITCHYARD_LOADER_COMMENTED_VAR");
        let input = "# master_key = \"${SWITCHYARD_LOADER_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${SWITCHYARD_LOADER_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[registry]
path = "/tmp/switchyard-registry.json"

[circuit_breaker]
failure_threshold = 2
reset_timeout_seconds = 5
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.registry.path, "/tmp/switchyard-registry.json");
        assert_eq!(config.circuit_breaker.failure_threshold, 2);
        assert_eq!(config.security.secrets_path, ".switchyard/secrets.json");
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[circuit_breaker]\nfailure_threshold = 0\n")
            .unwrap();
        temp_file.flush().unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("failure_threshold"));
    }
}
