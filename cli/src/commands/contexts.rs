// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Context administration commands
//!
//! Operates directly on the configured database; the service does not need
//! to be running.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use entrypoint_core::domain::repository::ContextRepository;
use entrypoint_core::domain::service_config::ServiceConfig;
use entrypoint_core::infrastructure::{Database, SqliteStore};

#[derive(Subcommand)]
pub enum ContextsCommand {
    /// List all contexts
    List,

    /// Create a context (no-op if it exists)
    Create {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a context and its entrypoint associations
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

pub async fn handle_command(
    command: ContextsCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    let config = ServiceConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let store = open_store(&config).await?;
    execute(command, &store).await
}

async fn open_store(config: &ServiceConfig) -> Result<SqliteStore> {
    let database = Database::new(&config.database_url)
        .await
        .context("Failed to open database")?;
    Ok(SqliteStore::new(database.get_pool().clone()))
}

async fn execute(command: ContextsCommand, store: &SqliteStore) -> Result<()> {
    match command {
        ContextsCommand::List => {
            let contexts = store.retrieve_contexts().await?;
            if contexts.is_empty() {
                println!("{}", "No contexts".dimmed());
            }
            for context in contexts {
                println!("{}", context);
            }
        }
        ContextsCommand::Create { name } => {
            store.create_context(&name).await?;
            println!("{}", format!("✓ Context '{}' created", name).green());
        }
        ContextsCommand::Delete { name } => {
            store
                .delete_context(&name)
                .await
                .with_context(|| format!("Failed to delete context '{}'", name))?;
            println!("{}", format!("✓ Context '{}' deleted", name).green());
        }
    }
    Ok(())
}
