// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use sqlx::{Row, SqliteConnection};

use super::{is_unique_violation, map_sqlx_error};
use crate::domain::context::Context;
use crate::domain::repository::StoreError;

pub(crate) async fn create_context(
    conn: &mut SqliteConnection,
    context_name: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query("INSERT INTO contexts (context_name) VALUES (?)")
        .bind(context_name)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Ok(()),
        Err(e) => Err(map_sqlx_error(e)),
    }
}

pub(crate) async fn retrieve_contexts(
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, StoreError> {
    sqlx::query_scalar("SELECT context_name FROM contexts ORDER BY context_name")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}

pub(crate) async fn delete_context(
    conn: &mut SqliteConnection,
    context_name: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM contexts WHERE context_name = ?")
        .bind(context_name)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("context '{}'", context_name)));
    }
    Ok(())
}

pub(crate) async fn find_context(
    conn: &mut SqliteConnection,
    context_name: &str,
) -> Result<Option<Context>, StoreError> {
    let row = sqlx::query("SELECT id, context_name FROM contexts WHERE context_name = ?")
        .bind(context_name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match row {
        Some(row) => Ok(Some(Context {
            id: row.try_get("id").map_err(map_sqlx_error)?,
            name: row.try_get("context_name").map_err(map_sqlx_error)?,
        })),
        None => Ok(None),
    }
}

/// Resolve a context that callers named explicitly (create, tag, untag).
pub(crate) async fn resolve_context(
    conn: &mut SqliteConnection,
    context_name: &str,
) -> Result<Context, StoreError> {
    find_context(conn, context_name)
        .await?
        .ok_or_else(|| StoreError::UnknownReference(format!("context '{}'", context_name)))
}
