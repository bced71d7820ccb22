//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Switchyard using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Switchyard - Enterprise Integration Gateway
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(version, about, long_about = None)]
#[command(author = "Switchyard Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "switchyard.toml", env = "SWITCHYARD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SWITCHYARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file and master key
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// List registered systems
    Systems(commands::systems::SystemsArgs),

    /// Manage stored secrets
    Secrets(commands::secrets::SecretsArgs),

    /// Webhook secrets and signature checks
    Webhook(commands::webhook::WebhookArgs),
}
