// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service Factory - Application Layer
//!
//! Wires the store, the type registry and the application services from a
//! [`ServiceConfig`]. Used by the daemon and by integration tests.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::application::entrypoint_manager::EntrypointManager;
use crate::application::launch::LaunchResolver;
use crate::application::validation::ValidationPipeline;
use crate::domain::service_config::ServiceConfig;
use crate::infrastructure::db::Database;
use crate::infrastructure::entrypoint_types::EntrypointTypeRegistry;
use crate::infrastructure::store::SqliteStore;

/// Application services sharing one store and one registry.
pub struct Services {
    pub store: SqliteStore,
    pub registry: Arc<EntrypointTypeRegistry>,
    pub manager: Arc<EntrypointManager>,
    pub launcher: Arc<LaunchResolver>,
}

/// Connect to the database, build the registry and create configured contexts.
pub async fn build_services(config: &ServiceConfig) -> Result<Services> {
    config.validate().context("Invalid configuration")?;

    let database = Database::new(&config.database_url)
        .await
        .context("Failed to open database")?;
    let store = SqliteStore::new(database.get_pool().clone());

    let registry = Arc::new(
        EntrypointTypeRegistry::from_config(config)
            .context("Failed to initialize entrypoint types")?,
    );

    let manager = Arc::new(EntrypointManager::new(
        store.clone(),
        ValidationPipeline::new(registry.clone()),
        config.context_names(),
    ));
    manager
        .bootstrap_contexts()
        .await
        .context("Failed to create configured contexts")?;

    let launcher = Arc::new(LaunchResolver::new(
        Arc::new(store.clone()),
        registry.clone(),
    ));

    info!(
        "Services ready ({} entrypoint type(s), {} context(s))",
        registry.type_names().len(),
        config.contexts.len()
    );

    Ok(Services {
        store,
        registry,
        manager,
        launcher,
    })
}
