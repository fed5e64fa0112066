// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Entrypoint Manager Application Service
//!
//! Use cases behind the management API. Each one validates first, outside
//! any transaction, and only then touches the store:
//! - Domain layer: EntrypointType, repository traits
//! - Infrastructure layer: SqliteStore, EntrypointTypeRegistry
//!
//! Context names a caller submits must be among the configured contexts.
//! Submitting none tags the entrypoint with every configured context.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::validation::ValidationPipeline;
use crate::domain::entrypoint::{
    entrypoint_name_from, EntrypointData, EntrypointFilter, EntrypointListing, EntrypointLookup,
    EntrypointRecord, EntrypointUuid, SelectedEntrypoint,
};
use crate::domain::entrypoint_type::{TypeSummary, ValidationError};
use crate::domain::repository::{
    ContextRepository, EntrypointRepository, SelectionRepository, StoreError,
};
use crate::infrastructure::store::SqliteStore;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown entrypoint type: {0}")]
    UnknownType(String),
}

pub struct EntrypointManager {
    store: SqliteStore,
    pipeline: ValidationPipeline,
    contexts: Vec<String>,
}

impl EntrypointManager {
    /// `contexts` is the configured set callers may tag with.
    pub fn new(store: SqliteStore, pipeline: ValidationPipeline, contexts: Vec<String>) -> Self {
        Self {
            store,
            pipeline,
            contexts,
        }
    }

    /// Create every configured context; existing ones are left alone.
    pub async fn bootstrap_contexts(&self) -> Result<(), ManagerError> {
        for context in &self.contexts {
            self.store.create_context(context).await?;
        }
        info!("Ensured {} configured context(s)", self.contexts.len());
        Ok(())
    }

    pub async fn create_entrypoint(
        &self,
        user: &str,
        entrypoint_type: &str,
        data: EntrypointData,
        context_names: Vec<String>,
    ) -> Result<EntrypointUuid, ManagerError> {
        self.pipeline.validate(user, entrypoint_type, &data).await?;
        let name = entrypoint_name_from(&data).ok_or(ValidationError)?;
        let context_names = self.resolve_contexts(context_names)?;

        let uuid = self
            .store
            .create_entrypoint(user, name, entrypoint_type, &data, &context_names)
            .await?;

        info!(user = %user, entrypoint_type = %entrypoint_type, uuid = %uuid, "Created entrypoint");
        Ok(uuid)
    }

    /// Replace data and context set of an existing entrypoint.
    ///
    /// The stored type is kept. Rename, data update and the tag/untag diff
    /// commit together or not at all.
    pub async fn update_entrypoint(
        &self,
        user: &str,
        uuid: EntrypointUuid,
        data: EntrypointData,
        context_names: Vec<String>,
    ) -> Result<(), ManagerError> {
        let current = self
            .store
            .retrieve_one_entrypoint(user, &EntrypointLookup::Uuid(uuid))
            .await?;

        self.pipeline
            .validate(user, &current.entrypoint_type, &data)
            .await?;
        let name = entrypoint_name_from(&data).ok_or(ValidationError)?;
        let desired: BTreeSet<String> = self.resolve_contexts(context_names)?.into_iter().collect();
        let existing: BTreeSet<String> = current.context_names.into_iter().collect();

        let tx = self.store.begin().await?;
        tx.update_entrypoint_by_uuid(user, uuid, name, &data).await?;
        for added in desired.difference(&existing) {
            tx.tag_entrypoint(user, name, added).await?;
        }
        for removed in existing.difference(&desired) {
            tx.untag_entrypoint(user, name, removed).await?;
        }
        tx.commit().await?;

        info!(user = %user, uuid = %uuid, "Updated entrypoint");
        Ok(())
    }

    pub async fn get_entrypoint(
        &self,
        user: &str,
        lookup: &EntrypointLookup,
    ) -> Result<EntrypointRecord, ManagerError> {
        Ok(self.store.retrieve_one_entrypoint(user, lookup).await?)
    }

    pub async fn list_entrypoints(
        &self,
        user: &str,
        filter: &EntrypointFilter,
    ) -> Result<EntrypointListing, ManagerError> {
        Ok(self.store.retrieve_many_entrypoints(user, filter).await?)
    }

    pub async fn delete_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
    ) -> Result<(), ManagerError> {
        self.store.delete_entrypoint(user, entrypoint_name).await?;
        info!(user = %user, "Deleted entrypoint");
        Ok(())
    }

    /// Delete by uuid in a single statement, so a concurrent rename cannot
    /// redirect the delete to another row.
    pub async fn delete_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
    ) -> Result<(), ManagerError> {
        self.store.delete_entrypoint_by_uuid(user, uuid).await?;
        info!(user = %user, uuid = %uuid, "Deleted entrypoint");
        Ok(())
    }

    pub async fn select(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), ManagerError> {
        self.store
            .update_selection(user, entrypoint_name, context_name)
            .await?;
        debug!(user = %user, context = %context_name, "Selection updated");
        Ok(())
    }

    pub async fn get_selection(
        &self,
        user: &str,
        context_name: &str,
    ) -> Result<SelectedEntrypoint, ManagerError> {
        Ok(self.store.retrieve_selection(user, context_name).await?)
    }

    pub async fn clear_selection(
        &self,
        user: &str,
        context_name: &str,
    ) -> Result<(), ManagerError> {
        self.store.delete_selection(user, context_name).await?;
        debug!(user = %user, context = %context_name, "Selection cleared");
        Ok(())
    }

    pub async fn list_contexts(&self) -> Result<Vec<String>, ManagerError> {
        Ok(self.store.retrieve_contexts().await?)
    }

    pub fn entrypoint_types(&self) -> Vec<TypeSummary> {
        self.pipeline.registry().describe()
    }

    /// Choices for every field of `entrypoint_type`; `None` means free text.
    pub async fn field_options(
        &self,
        user: &str,
        entrypoint_type: &str,
    ) -> Result<BTreeMap<String, Option<Vec<String>>>, ManagerError> {
        let resolved = self
            .pipeline
            .registry()
            .get(entrypoint_type)
            .ok_or_else(|| ManagerError::UnknownType(entrypoint_type.to_string()))?;

        let mut options = BTreeMap::new();
        for field in resolved.schema().fields() {
            let choices = resolved.field_options(user, &field.name).await;
            options.insert(field.name.clone(), choices);
        }
        Ok(options)
    }

    /// Empty means every configured context; anything unconfigured is rejected.
    fn resolve_contexts(&self, context_names: Vec<String>) -> Result<Vec<String>, ValidationError> {
        if context_names.is_empty() {
            return Ok(self.contexts.clone());
        }
        if context_names.iter().all(|name| self.contexts.contains(name)) {
            Ok(context_names)
        } else {
            Err(ValidationError)
        }
    }
}
