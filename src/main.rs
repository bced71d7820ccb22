// Switchyard - Enterprise Integration Gateway
// Copyright (c) 2025 Switchyard Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use switchyard::cli::{Cli, Commands};
use switchyard::config::LoggingConfig;
use switchyard::domain::GatewayError;
use switchyard::log_error_with_context;
use switchyard::logging::init_logging;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging for CLI commands
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let logging_config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    let logging_guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Switchyard - Enterprise Integration Gateway"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            match e.downcast_ref::<GatewayError>() {
                Some(err) => {
                    log_error_with_context!(err, "Command execution failed");
                    if matches!(err, GatewayError::Configuration(_)) {
                        2
                    } else {
                        5
                    }
                }
                None => {
                    tracing::error!(error = %e, "Command execution failed");
                    5
                }
            }
        }
    };

    // process::exit skips destructors
    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Init(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Systems(args) => args.execute(&cli.config).await,
        Commands::Secrets(args) => args.execute(&cli.config).await,
        Commands::Webhook(args) => args.execute(&cli.config).await,
    }
}
