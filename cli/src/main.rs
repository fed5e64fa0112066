// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Entrypoint Service CLI
//!
//! The `entrypoint-service` binary runs the HTTP service and offers a few
//! administrative commands against the same database.
//!
//! ## Commands
//!
//! - `entrypoint-service serve` - Run the HTTP API
//! - `entrypoint-service config show|validate` - Configuration management
//! - `entrypoint-service contexts list|create|delete` - Context administration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use entrypoint_core::domain::service_config::ServiceConfig;

mod commands;

use commands::{ConfigCommand, ContextsCommand, ServeArgs};

/// Entrypoint Service - per-user launch configurations for notebook hubs
#[derive(Parser)]
#[command(name = "entrypoint-service")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ENTRYPOINT_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the config's log_level
    #[arg(long, global = true, env = "ENTRYPOINT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Context administration
    #[command(name = "contexts")]
    Contexts {
        #[command(subcommand)]
        command: ContextsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match &cli.log_level {
        Some(level) => level.clone(),
        None => ServiceConfig::load_or_default(cli.config.clone())
            .map(|config| config.log_level)
            .unwrap_or_else(|_| "info".to_string()),
    };
    init_logging(&level)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Contexts { command } => {
            commands::contexts::handle_command(command, cli.config).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
