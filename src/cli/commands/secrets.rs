//! Secrets command implementation
//!
//! Stores authentication secrets for a system and lists which keys exist.
//! Values are never printed.

use crate::config::load_config;
use crate::core::context::open_security;
use clap::{Args, Subcommand};
use std::collections::HashMap;

/// Arguments for the secrets command
#[derive(Args, Debug)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub action: SecretsAction,
}

/// Secret store operations
#[derive(Subcommand, Debug)]
pub enum SecretsAction {
    /// Store authentication secrets (KEY=VALUE pairs) for a system
    Store {
        /// System identifier
        system_id: String,

        /// Secrets as KEY=VALUE
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },

    /// List the secret keys stored for a system
    List {
        /// System identifier
        system_id: String,
    },
}

impl SecretsArgs {
    /// Execute the secrets command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        let security = open_security(&config.security).await?;

        match &self.action {
            SecretsAction::Store { system_id, pairs } => {
                let credentials: HashMap<String, String> = pairs.iter().cloned().collect();
                security.store_credentials(system_id, &credentials).await?;

                let mut names: Vec<&str> = credentials.keys().map(String::as_str).collect();
                names.sort_unstable();
                println!("🔐 Stored {} secret(s) for {system_id}: {}", names.len(), names.join(", "));
                Ok(0)
            }
            SecretsAction::List { system_id } => {
                let keys = security.store().list_keys(&format!("{system_id}:")).await;
                if keys.is_empty() {
                    println!("No secrets stored for {system_id}.");
                } else {
                    println!("🔐 Secrets for {system_id}:");
                    for key in &keys {
                        println!("  {key}");
                    }
                }
                Ok(0)
            }
        }
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
