//! Systems command implementation
//!
//! Lists the systems in the integration registry.

use crate::adapters::registry::{FileRegistry, IntegrationRegistry, SystemFilter};
use crate::config::load_config;
use crate::domain::IntegrationConfig;
use clap::Args;

/// Arguments for the systems command
#[derive(Args, Debug)]
pub struct SystemsArgs {
    /// Only systems of this type
    #[arg(long = "type")]
    pub system_type: Option<String>,

    /// Hide disabled systems
    #[arg(long)]
    pub enabled_only: bool,
}

impl SystemsArgs {
    /// Execute the systems command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let registry = FileRegistry::open(&config.registry.path).await?;
        let systems = registry.list_systems(&self.filter()).await?;

        println!("📋 Registered systems ({})", config.registry.path);
        println!();

        if systems.is_empty() {
            println!("No systems registered.");
            return Ok(0);
        }

        for system in &systems {
            println!("{}", describe(system));
        }
        println!();
        println!("Total: {}", systems.len());
        Ok(0)
    }

    fn filter(&self) -> SystemFilter {
        SystemFilter {
            system_type: self.system_type.clone(),
            enabled: self.enabled_only.then_some(true),
        }
    }
}

fn describe(system: &IntegrationConfig) -> String {
    let status = if system.enabled { "✅" } else { "⏸️ " };
    let mut features = Vec::new();
    if system.metadata.supports_batch {
        features.push("batch");
    }
    if system.metadata.supports_webhooks {
        features.push("webhooks");
    }

    let mut line = format!(
        "{status} {} [{}] {} (auth: {})",
        system.system_id,
        system.system_type,
        system.name,
        system.auth_type().unwrap_or("default")
    );
    if !features.is_empty() {
        line.push_str(&format!(" +{}", features.join(",")));
    }
    line
}
