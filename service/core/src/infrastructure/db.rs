// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # SQLite Connection Pool
//!
//! Wraps `sqlx::sqlite::SqlitePool` in a thin `Database` newtype that can be
//! injected into the store.
//!
//! SQLite ships with foreign keys disabled. Every connection is opened with
//! `PRAGMA foreign_keys = ON` and startup fails unless the pragma reads back
//! as enabled, because entrypoint and context deletion rely on
//! `ON DELETE CASCADE` to drop association rows.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Statements run at startup; all are idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS contexts (
        id INTEGER PRIMARY KEY,
        context_name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entrypoints (
        id INTEGER PRIMARY KEY,
        uuid TEXT NOT NULL UNIQUE,
        owner TEXT NOT NULL,
        entrypoint_name TEXT NOT NULL,
        entrypoint_type TEXT NOT NULL,
        entrypoint_data TEXT NOT NULL,
        UNIQUE (owner, entrypoint_name)
    )
    "#,
    // selecting_user is NULL for plain tags; NULLs never collide, so the
    // unique pair allows at most one selected row per (context, user).
    r#"
    CREATE TABLE IF NOT EXISTS entrypoint_contexts (
        entrypoint_id INTEGER NOT NULL REFERENCES entrypoints (id) ON DELETE CASCADE,
        context_id INTEGER NOT NULL REFERENCES contexts (id) ON DELETE CASCADE,
        selecting_user TEXT,
        PRIMARY KEY (entrypoint_id, context_id),
        UNIQUE (context_id, selecting_user)
    )
    "#,
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect, enforce foreign keys and create the schema.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)
            .with_context(|| format!("Invalid database URL: {}", connection_string))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Each in-memory connection is its own database: pin exactly one.
        let pool = if is_in_memory(connection_string) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let database = Self { pool };
        database.verify_foreign_keys().await?;
        database.initialize_schema().await?;

        info!("Database ready");
        Ok(database)
    }

    /// Fails unless the connection reports foreign key enforcement.
    pub async fn verify_foreign_keys(&self) -> Result<()> {
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read foreign_keys pragma")?;

        if enabled != 1 {
            anyhow::bail!("SQLite foreign key enforcement is disabled");
        }
        Ok(())
    }

    pub async fn initialize_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create schema")?;
        }
        Ok(())
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}
