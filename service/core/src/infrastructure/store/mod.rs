// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! SQLite Store
//!
//! Implements the domain repository traits over the three-table schema
//! created by [`crate::infrastructure::db::Database`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Transactional persistence for contexts, entrypoints and
//!   selections
//!
//! The SQL for each operation lives in a free function taking
//! `&mut SqliteConnection`, so the same statements run either inside a
//! per-call transaction ([`SqliteStore`]) or inside a caller-owned one
//! ([`StoreTransaction`]).

pub(crate) mod contexts;
pub(crate) mod entrypoints;
pub(crate) mod selections;

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;
use tokio::sync::Mutex;

use crate::domain::entrypoint::{
    EntrypointData, EntrypointFilter, EntrypointListing, EntrypointLookup, EntrypointRecord,
    EntrypointUuid, SelectedEntrypoint,
};
use crate::domain::repository::{
    ContextRepository, EntrypointRepository, SelectionRepository, StoreError,
};

/// Map an sqlx error onto the repository error space.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateName(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::UnknownReference(db.message().to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Pool-backed store; every trait call is its own transaction.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a transaction spanning several repository calls.
    pub async fn begin(&self) -> Result<StoreTransaction, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(StoreTransaction {
            tx: Mutex::new(tx),
        })
    }

    async fn write(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool.begin().await.map_err(map_sqlx_error)
    }
}

async fn commit(tx: Transaction<'static, Sqlite>) -> Result<(), StoreError> {
    tx.commit().await.map_err(map_sqlx_error)
}

#[async_trait]
impl ContextRepository for SqliteStore {
    async fn create_context(&self, context_name: &str) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        contexts::create_context(&mut tx, context_name).await?;
        commit(tx).await
    }

    async fn retrieve_contexts(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        contexts::retrieve_contexts(&mut conn).await
    }

    async fn delete_context(&self, context_name: &str) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        contexts::delete_context(&mut tx, context_name).await?;
        commit(tx).await
    }
}

#[async_trait]
impl EntrypointRepository for SqliteStore {
    async fn create_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        entrypoint_type: &str,
        entrypoint_data: &EntrypointData,
        context_names: &[String],
    ) -> Result<EntrypointUuid, StoreError> {
        let mut tx = self.write().await?;
        let uuid = entrypoints::create_entrypoint(
            &mut tx,
            user,
            entrypoint_name,
            entrypoint_type,
            entrypoint_data,
            context_names,
        )
        .await?;
        commit(tx).await?;
        Ok(uuid)
    }

    async fn retrieve_one_entrypoint(
        &self,
        user: &str,
        lookup: &EntrypointLookup,
    ) -> Result<EntrypointRecord, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        entrypoints::retrieve_one(&mut conn, user, lookup).await
    }

    async fn retrieve_many_entrypoints(
        &self,
        user: &str,
        filter: &EntrypointFilter,
    ) -> Result<EntrypointListing, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        entrypoints::retrieve_many(&mut conn, user, filter).await
    }

    async fn update_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        entrypoint_type: &str,
        entrypoint_data: &EntrypointData,
    ) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        entrypoints::update_entrypoint(
            &mut tx,
            user,
            entrypoint_name,
            entrypoint_type,
            entrypoint_data,
        )
        .await?;
        commit(tx).await
    }

    async fn update_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
        entrypoint_name: &str,
        entrypoint_data: &EntrypointData,
    ) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        entrypoints::update_entrypoint_by_uuid(
            &mut tx,
            user,
            uuid,
            entrypoint_name,
            entrypoint_data,
        )
        .await?;
        commit(tx).await
    }

    async fn tag_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        entrypoints::tag_entrypoint(&mut tx, user, entrypoint_name, context_name).await?;
        commit(tx).await
    }

    async fn untag_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        entrypoints::untag_entrypoint(&mut tx, user, entrypoint_name, context_name).await?;
        commit(tx).await
    }

    async fn delete_entrypoint(&self, user: &str, entrypoint_name: &str) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        entrypoints::delete_entrypoint(&mut tx, user, entrypoint_name).await?;
        commit(tx).await
    }

    async fn delete_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
    ) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        entrypoints::delete_entrypoint_by_uuid(&mut tx, user, uuid).await?;
        commit(tx).await
    }
}

#[async_trait]
impl SelectionRepository for SqliteStore {
    async fn update_selection(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        selections::update_selection(&mut tx, user, entrypoint_name, context_name).await?;
        commit(tx).await
    }

    async fn retrieve_selection(
        &self,
        user: &str,
        context_name: &str,
    ) -> Result<SelectedEntrypoint, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        selections::retrieve_selection(&mut conn, user, context_name).await
    }

    async fn delete_selection(&self, user: &str, context_name: &str) -> Result<(), StoreError> {
        let mut tx = self.write().await?;
        selections::delete_selection(&mut tx, user, context_name).await?;
        commit(tx).await
    }
}

/// A caller-owned transaction. Nothing is visible to other connections
/// until [`StoreTransaction::commit`]; dropping it rolls everything back.
pub struct StoreTransaction {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl StoreTransaction {
    pub async fn commit(self) -> Result<(), StoreError> {
        commit(self.tx.into_inner()).await
    }

    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .into_inner()
            .rollback()
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ContextRepository for StoreTransaction {
    async fn create_context(&self, context_name: &str) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        contexts::create_context(&mut tx, context_name).await
    }

    async fn retrieve_contexts(&self) -> Result<Vec<String>, StoreError> {
        let mut tx = self.tx.lock().await;
        contexts::retrieve_contexts(&mut tx).await
    }

    async fn delete_context(&self, context_name: &str) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        contexts::delete_context(&mut tx, context_name).await
    }
}

#[async_trait]
impl EntrypointRepository for StoreTransaction {
    async fn create_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        entrypoint_type: &str,
        entrypoint_data: &EntrypointData,
        context_names: &[String],
    ) -> Result<EntrypointUuid, StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::create_entrypoint(
            &mut tx,
            user,
            entrypoint_name,
            entrypoint_type,
            entrypoint_data,
            context_names,
        )
        .await
    }

    async fn retrieve_one_entrypoint(
        &self,
        user: &str,
        lookup: &EntrypointLookup,
    ) -> Result<EntrypointRecord, StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::retrieve_one(&mut tx, user, lookup).await
    }

    async fn retrieve_many_entrypoints(
        &self,
        user: &str,
        filter: &EntrypointFilter,
    ) -> Result<EntrypointListing, StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::retrieve_many(&mut tx, user, filter).await
    }

    async fn update_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        entrypoint_type: &str,
        entrypoint_data: &EntrypointData,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::update_entrypoint(
            &mut tx,
            user,
            entrypoint_name,
            entrypoint_type,
            entrypoint_data,
        )
        .await
    }

    async fn update_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
        entrypoint_name: &str,
        entrypoint_data: &EntrypointData,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::update_entrypoint_by_uuid(
            &mut tx,
            user,
            uuid,
            entrypoint_name,
            entrypoint_data,
        )
        .await
    }

    async fn tag_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::tag_entrypoint(&mut tx, user, entrypoint_name, context_name).await
    }

    async fn untag_entrypoint(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::untag_entrypoint(&mut tx, user, entrypoint_name, context_name).await
    }

    async fn delete_entrypoint(&self, user: &str, entrypoint_name: &str) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::delete_entrypoint(&mut tx, user, entrypoint_name).await
    }

    async fn delete_entrypoint_by_uuid(
        &self,
        user: &str,
        uuid: EntrypointUuid,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        entrypoints::delete_entrypoint_by_uuid(&mut tx, user, uuid).await
    }
}

#[async_trait]
impl SelectionRepository for StoreTransaction {
    async fn update_selection(
        &self,
        user: &str,
        entrypoint_name: &str,
        context_name: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        selections::update_selection(&mut tx, user, entrypoint_name, context_name).await
    }

    async fn retrieve_selection(
        &self,
        user: &str,
        context_name: &str,
    ) -> Result<SelectedEntrypoint, StoreError> {
        let mut tx = self.tx.lock().await;
        selections::retrieve_selection(&mut tx, user, context_name).await
    }

    async fn delete_selection(&self, user: &str, context_name: &str) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        selections::delete_selection(&mut tx, user, context_name).await
    }
}
