// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for contexts, entrypoints and selections. Each method
//! is one logical operation: implementations run it atomically, and a failed
//! call leaves no partial effect behind.
//!
//! | Trait | Concern |
//! |-------|---------|
//! | `ContextRepository` | Context lifecycle |
//! | `EntrypointRepository` | Entrypoint CRUD + tagging |
//! | `SelectionRepository` | One selection per (user, context) |
//!
//! `SqliteStore` and `StoreTransaction` implement all three.
//!
//! `SqliteStore` commits every call on its own. `StoreTransaction` groups
//! several calls and commits them together, which is how an update that
//! renames an entrypoint and re-tags it stays all-or-nothing.

use async_trait::async_trait;

use crate::domain::entrypoint::{
    EntrypointData, EntrypointFilter, EntrypointListing, EntrypointLookup, EntrypointRecord,
    EntrypointUuid, SelectedEntrypoint,
};

/// Repository interface for contexts
#[async_trait]
pub trait ContextRepository: Send + Sync {
    /// Create a context; an existing name is left untouched
    async fn create_context(&self, context_name: &str) -> Result<(), StoreError>;

    /// All context names, sorted
    async fn retrieve_contexts(&self) -> Result<Vec<String>, StoreError>;

    /// Delete a context and every association that references it
    async fn delete_context(&self, context_name: &str) -> Result<(), StoreError>;
}

/// Repository interface for entrypoints and their context associations
#[async_trait]
pub trait EntrypointRepository: Send + Sync {
    /// Insert an entrypoint tagged with `context_names`, returning its uuid
    async fn create_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        entrypoint_type: &str,
        entrypoint_data: &EntrypointData,
        context_names: &[String],
    ) -> Result<EntrypointUuid, StoreError>;

    /// Fetch one entrypoint with its sorted context names
    async fn retrieve_one_entrypoint(
        &self,
        user: &str,
        lookup: &EntrypointLookup,
    ) -> Result<EntrypointRecord, StoreError>;

    /// Group a user's tagged entrypoints by context, then by type
    async fn retrieve_many_entrypoints(
        &self,
        user: &str,
        filter: &EntrypointFilter,
    ) -> Result<EntrypointListing, StoreError>;

    /// Replace type and data of an entrypoint addressed by name
    async fn update_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        entrypoint_type: &str,
        entrypoint_data: &EntrypointData,
    ) -> Result<(), StoreError>;

    /// Rename an entrypoint addressed by uuid and replace its data
    async fn update_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
        entrypoint_name: &str,
        entrypoint_data: &EntrypointData,
    ) -> Result<(), StoreError>;

    /// Associate an entrypoint with a context; repeating it is a no-op
    async fn tag_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError>;

    /// Remove an association, dropping any selection it carried
    async fn untag_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError>;

    /// Delete an entrypoint together with its associations
    async fn delete_entrypoint(&self, user: &str, entrypoint_name: &str) -> Result<(), StoreError>;

    /// Delete the entrypoint with this uuid, whatever its current name
    async fn delete_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
    ) -> Result<(), StoreError>;
}

/// Repository interface for per-context selections
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Make `entrypoint_name` the user's selection for `context_name`
    async fn update_selection(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError>;

    /// The user's current selection for `context_name`
    async fn retrieve_selection(
        &self,
        user: &str,
        context_name: &str,
    ) -> Result<SelectedEntrypoint, StoreError>;

    /// Clear the user's selection for `context_name`; no selection is not an error
    async fn delete_selection(&self, user: &str, context_name: &str) -> Result<(), StoreError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    #[error("Invalid lookup: {0}")]
    InvalidLookup(String),

    #[error("Selection conflict: {0}")]
    SelectionConflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
