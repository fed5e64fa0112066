// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use sqlx::types::Json;
use sqlx::{Row, SqliteConnection};

use super::contexts::find_context;
use super::entrypoints::require_entrypoint;
use super::{is_unique_violation, map_sqlx_error};
use crate::domain::entrypoint::{EntrypointData, SelectedEntrypoint};
use crate::domain::repository::StoreError;

/// Clear, then set. The clear is the first statement so that the
/// transaction takes SQLite's write lock before anything is read; a
/// concurrent selector for the same (user, context) waits behind it.
pub(crate) async fn update_selection(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
    context_name: &str,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE entrypoint_contexts
        SET selecting_user = NULL
        WHERE selecting_user = ?
          AND context_id = (SELECT id FROM contexts WHERE context_name = ?)
        "#,
    )
    .bind(user)
    .bind(context_name)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let context = find_context(conn, context_name)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("context '{}'", context_name)))?;
    let entrypoint = require_entrypoint(conn, user, entrypoint_name).await?;

    let result = sqlx::query(
        r#"
        UPDATE entrypoint_contexts
        SET selecting_user = ?
        WHERE entrypoint_id = ? AND context_id = ?
        "#,
    )
    .bind(user)
    .bind(entrypoint.id)
    .bind(context.id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::SelectionConflict(format!(
                "user '{}' already holds a selection in context '{}'",
                user, context_name
            ))
        } else {
            map_sqlx_error(e)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "entrypoint '{}' is not tagged with context '{}'",
            entrypoint_name, context_name
        )));
    }
    Ok(())
}

pub(crate) async fn retrieve_selection(
    conn: &mut SqliteConnection,
    user: &str,
    context_name: &str,
) -> Result<SelectedEntrypoint, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT e.entrypoint_type, e.entrypoint_data
        FROM entrypoint_contexts ec
        JOIN entrypoints e ON e.id = ec.entrypoint_id
        JOIN contexts c ON c.id = ec.context_id
        WHERE ec.selecting_user = ? AND c.context_name = ?
        "#,
    )
    .bind(user)
    .bind(context_name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?
    .ok_or_else(|| {
        StoreError::NotFound(format!(
            "no selection for user '{}' in context '{}'",
            user, context_name
        ))
    })?;

    let data: Json<EntrypointData> = row.try_get("entrypoint_data").map_err(map_sqlx_error)?;
    Ok(SelectedEntrypoint {
        entrypoint_type: row.try_get("entrypoint_type").map_err(map_sqlx_error)?,
        entrypoint_data: data.0,
    })
}

pub(crate) async fn delete_selection(
    conn: &mut SqliteConnection,
    user: &str,
    context_name: &str,
) -> Result<(), StoreError> {
    let context = find_context(conn, context_name)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("context '{}'", context_name)))?;

    sqlx::query(
        r#"
        UPDATE entrypoint_contexts
        SET selecting_user = NULL
        WHERE selecting_user = ? AND context_id = ?
        "#,
    )
    .bind(user)
    .bind(context.id)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}
