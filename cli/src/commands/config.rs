// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use entrypoint_core::domain::service_config::{EntrypointTypeConfig, ServiceConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let mut config = ServiceConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. ENTRYPOINT_CONFIG_PATH: {}",
            std::env::var("ENTRYPOINT_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./entrypoint-config.yaml");
        println!("  4. ~/.entrypoint/config.yaml");
        println!("  5. /etc/entrypoint/config.yaml");
        println!();
    }

    mask_secrets(&mut config);

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", config.to_yaml_string()?);

    Ok(())
}

/// Hide literal tokens; `env:VAR` references are printed as they are.
fn mask_secrets(config: &mut ServiceConfig) {
    mask(&mut config.api_token);
    for entrypoint_type in &mut config.entrypoint_types {
        if let EntrypointTypeConfig::ContainerImage(image) = entrypoint_type {
            mask(&mut image.api_token);
        }
    }
}

fn mask(secret: &mut Option<String>) {
    if let Some(value) = secret {
        if !value.starts_with("env:") {
            *value = "********".to_string();
        }
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServiceConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}
