//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Switchyard configuration file.

use crate::adapters::registry::{FileRegistry, IntegrationRegistry, SystemFilter};
use crate::config::load_config;
use crate::core::transform::SchemaRegistry;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = config.validate() {
            println!("❌ Configuration validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(2);
        }
        println!("✅ Configuration is valid");

        let systems = match FileRegistry::open(&config.registry.path).await {
            Ok(registry) => registry.list_systems(&SystemFilter::default()).await?,
            Err(e) => {
                println!("❌ Failed to read registry: {}", config.registry.path);
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let schema_count = match &config.schemas.directory {
            Some(dir) => match SchemaRegistry::new().load_dir(dir) {
                Ok(count) => Some(count),
                Err(e) => {
                    println!("❌ Failed to load schemas from {dir}");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            },
            None => None,
        };

        let key_source = if config.security.master_key.is_some() {
            "inline".to_string()
        } else {
            config.security.master_key_path.clone()
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Master Key: {key_source}");
        println!("  Secrets File: {}", config.security.secrets_path);
        println!("  Default Auth Type: {}", config.security.default_auth_type);
        println!("  Registry: {}", config.registry.path);
        println!(
            "  Systems: {} ({} enabled)",
            systems.len(),
            systems.iter().filter(|s| s.enabled).count()
        );
        match schema_count {
            Some(count) => println!("  Schemas: {count}"),
            None => println!("  Schemas: none configured"),
        }
        println!(
            "  Circuit Breaker: {} failures, {}s reset",
            config.circuit_breaker.failure_threshold, config.circuit_breaker.reset_timeout_seconds
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        let code = ValidateArgs {}
            .execute(&path.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_valid_config() {
        let dir = TempDir::new().unwrap();
        let registry = dir.path().join("registry.json");
        let config = dir.path().join("switchyard.toml");
        std::fs::write(
            &config,
            format!(
                "[registry]\npath = \"{}\"\n\n[circuit_breaker]\nfailure_threshold = 3\n",
                registry.display()
            ),
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(&config.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_threshold() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("switchyard.toml");
        std::fs::write(&config, "[circuit_breaker]\nfailure_threshold = 0\n").unwrap();

        let code = ValidateArgs {}
            .execute(&config.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
