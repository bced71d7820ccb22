//! Webhook command implementation
//!
//! Generates webhook secrets and checks signatures of captured deliveries.

use crate::adapters::registry::{FileRegistry, IntegrationRegistry};
use crate::config::load_config;
use crate::core::context::open_security;
use crate::domain::SystemMetadata;
use clap::{Args, Subcommand};
use std::collections::HashMap;

/// Arguments for the webhook command
#[derive(Args, Debug)]
pub struct WebhookArgs {
    #[command(subcommand)]
    pub action: WebhookAction,
}

/// Webhook operations
#[derive(Subcommand, Debug)]
pub enum WebhookAction {
    /// Generate and store a new webhook secret; it is printed once
    GenerateSecret {
        /// System identifier
        system_id: String,
    },

    /// Verify the signature of a captured webhook delivery
    Verify {
        /// System identifier
        system_id: String,

        /// File with the raw request body
        #[arg(long)]
        payload: String,

        /// Request header as "Name: value" (repeatable)
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
}

impl WebhookArgs {
    /// Execute the webhook command
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
            WebhookAction::GenerateSecret { system_id } => {
                let secret = security.generate_webhook_secret(system_id).await?;
                println!("🔑 Webhook secret for {system_id}:");
                println!();
                println!("  {secret}");
                println!();
                println!("Store it with the sending system now; it will not be shown again.");
                Ok(0)
            }
            WebhookAction::Verify {
                system_id,
                payload,
                headers,
            } => {
                let body = tokio::fs::read(payload).await?;
                let headers: HashMap<String, String> = headers.iter().cloned().collect();

                // Use the system's signature settings when it is registered
                let registry = FileRegistry::open(&config.registry.path).await?;
                let metadata = registry
                    .get_system(system_id)
                    .await?
                    .map(|system| system.metadata)
                    .unwrap_or_else(SystemMetadata::default);

                if security
                    .verify_webhook(system_id, &metadata, &body, &headers)
                    .await?
                {
                    println!("✅ Signature valid");
                    Ok(0)
                } else {
                    println!("❌ Signature invalid");
                    Ok(1)
                }
            }
        }
    }
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected 'Name: value', got '{s}'")),
    }
}
