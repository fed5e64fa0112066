// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use entrypoint_core::domain::entrypoint::EntrypointData;
use entrypoint_core::domain::repository::ContextRepository;
use entrypoint_core::infrastructure::{Database, SqliteStore};
use serde_json::Value;
use std::path::Path;

pub const CONTEXTS: [&str; 3] = ["cori", "perlmutter", "spin"];

/// Fresh in-memory store with no contexts.
pub async fn empty_store() -> SqliteStore {
    let database = Database::new("sqlite::memory:").await.unwrap();
    SqliteStore::new(database.get_pool().clone())
}

/// File-backed database under `dir`, with a multi-connection pool.
pub async fn file_database(dir: &Path) -> Database {
    let url = format!("sqlite://{}", dir.join("entrypoint.db").display());
    Database::new(&url).await.unwrap()
}

/// Fresh in-memory store with [`CONTEXTS`] created.
pub async fn store() -> SqliteStore {
    let store = empty_store().await;
    for context in CONTEXTS {
        store.create_context(context).await.unwrap();
    }
    store
}

pub fn data(value: Value) -> EntrypointData {
    value.as_object().cloned().unwrap()
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
