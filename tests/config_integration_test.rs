//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX`.

use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use switchyard::config::load_config;
use switchyard::domain::GatewayError;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "SWITCHYARD_APPLICATION_LOG_LEVEL",
        "SWITCHYARD_SECURITY_MASTER_KEY",
        "SWITCHYARD_SECURITY_DEFAULT_AUTH_TYPE",
        "SWITCHYARD_REGISTRY_PATH",
        "SWITCHYARD_CIRCUIT_BREAKER_FAILURE_THRESHOLD",
        "SWITCHYARD_CIRCUIT_BREAKER_RESET_TIMEOUT_SECONDS",
        "TEST_SWITCHYARD_MASTER_KEY",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"

[security]
master_key_path = "/etc/switchyard/master.key"
secrets_path = "/var/lib/switchyard/secrets.json"
default_auth_type = "basic"

[registry]
path = "/etc/switchyard/registry.json"

[schemas]
directory = "/etc/switchyard/schemas"

[circuit_breaker]
failure_threshold = 3
reset_timeout_seconds = 30

[logging]
local_enabled = true
local_path = "/tmp/switchyard"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.security.master_key_path, "/etc/switchyard/master.key");
    assert_eq!(config.security.secrets_path, "/var/lib/switchyard/secrets.json");
    assert_eq!(config.security.default_auth_type, "basic");
    assert_eq!(config.registry.path, "/etc/switchyard/registry.json");
    assert_eq!(
        config.schemas.directory.as_deref(),
        Some("/etc/switchyard/schemas")
    );
    assert_eq!(config.circuit_breaker.failure_threshold, 3);
    assert_eq!(config.circuit_breaker.reset_timeout_seconds, 30);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("[application]\nlog_level = \"warn\"\n");

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.security.master_key_path, ".switchyard/master.key");
    assert!(config.security.master_key.is_none());
    assert_eq!(config.security.default_auth_type, "oauth2");
    assert_eq!(config.circuit_breaker.failure_threshold, 5);
    assert_eq!(config.circuit_breaker.reset_timeout_seconds, 60);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_SWITCHYARD_MASTER_KEY", "c2VjcmV0LWtleQ");

    let file = write_config("[security]\nmaster_key = \"${TEST_SWITCHYARD_MASTER_KEY}\"\n");

    let config = load_config(file.path()).unwrap();
    let key = config.security.master_key.expect("master key substituted");
    assert_eq!(key.expose_secret().as_ref(), "c2VjcmV0LWtleQ");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_config_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("[security]\nmaster_key = \"${TEST_SWITCHYARD_MASTER_KEY}\"\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
    assert!(err.to_string().contains("TEST_SWITCHYARD_MASTER_KEY"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("SWITCHYARD_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("SWITCHYARD_REGISTRY_PATH", "/srv/registry.json");
    std::env::set_var("SWITCHYARD_CIRCUIT_BREAKER_FAILURE_THRESHOLD", "9");
    std::env::set_var("SWITCHYARD_CIRCUIT_BREAKER_RESET_TIMEOUT_SECONDS", "not-a-number");

    let file = write_config(
        r#"
[application]
log_level = "info"

[circuit_breaker]
failure_threshold = 3
reset_timeout_seconds = 45
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.registry.path, "/srv/registry.json");
    assert_eq!(config.circuit_breaker.failure_threshold, 9);
    // Unparseable override leaves the file value in place
    assert_eq!(config.circuit_breaker.reset_timeout_seconds, 45);

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for content in [
        "[application]\nlog_level = \"loud\"\n",
        "[security]\ndefault_auth_type = \"kerberos\"\n",
        "[circuit_breaker]\nfailure_threshold = 0\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let file = write_config(content);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            matches!(err, GatewayError::Configuration(_)),
            "expected configuration error for {content:?}"
        );
    }
}

#[test]
fn test_missing_file_is_config_error() {
    let err = load_config("/nonexistent/switchyard.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
