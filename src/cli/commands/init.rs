//! Init command implementation
//!
//! Writes a sample `switchyard.toml` and generates the master key.

use crate::config::SecurityConfig;
use crate::security::MasterKey;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "switchyard.toml")]
    pub output: String,

    /// Where to write the master key
    #[arg(long)]
    pub master_key_path: Option<String>,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Switchyard configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let key_path = self
            .master_key_path
            .clone()
            .unwrap_or_else(|| SecurityConfig::default().master_key_path);

        if let Err(e) = fs::write(&self.output, Self::generate_config(&key_path)) {
            println!("❌ Failed to write configuration file");
            println!("   Error: {e}");
            return Ok(5);
        }
        println!("✅ Configuration file created: {}", self.output);

        let existed = Path::new(&key_path).exists();
        match MasterKey::load_or_generate(&key_path) {
            Ok(_) if existed => println!("✅ Using existing master key: {key_path}"),
            Ok(_) => println!("✅ Master key generated: {key_path}"),
            Err(e) => {
                println!("❌ Failed to create master key");
                println!("   Error: {e}");
                return Ok(5);
            }
        }

        println!();
        println!("Next steps:");
        println!("  1. Keep {key_path} safe; secrets cannot be decrypted without it");
        println!("  2. Register systems in the registry file");
        println!("  3. Store credentials: switchyard secrets store <system_id> KEY=VALUE");
        println!("  4. Validate configuration: switchyard validate-config");
        println!();
        Ok(0)
    }

    fn generate_config(master_key_path: &str) -> String {
        format!(
            r#"# Switchyard Configuration File
# Enterprise integration gateway

[application]
log_level = "info"

[security]
master_key_path = "{master_key_path}"
# master_key = "${{SWITCHYARD_MASTER_KEY}}"
secrets_path = ".switchyard/secrets.json"
default_auth_type = "oauth2"  # oauth2 | basic | api_key

[registry]
path = ".switchyard/registry.json"

[schemas]
# Holds internal/<entity>.json and external/<system_type>/<entity>.json
# directory = "schemas"

[circuit_breaker]
failure_threshold = 5
reset_timeout_seconds = 60

[logging]
local_enabled = false
local_path = "/var/log/switchyard"
local_rotation = "daily"  # daily | hourly | never
"#
        )
    }
}
