// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::collections::BTreeSet;

use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row, SqliteConnection};

use super::contexts::resolve_context;
use super::{is_unique_violation, map_sqlx_error};
use crate::domain::entrypoint::{
    Entrypoint, EntrypointData, EntrypointFilter, EntrypointListing, EntrypointLookup,
    EntrypointRecord, EntrypointUuid, ListedEntrypoint,
};
use crate::domain::repository::StoreError;

fn parse_uuid(raw: &str) -> Result<EntrypointUuid, StoreError> {
    EntrypointUuid::from_string(raw)
        .map_err(|e| StoreError::Serialization(format!("Invalid uuid '{}': {}", raw, e)))
}

fn parse_entrypoint_row(row: &SqliteRow) -> Result<Entrypoint, StoreError> {
    let uuid: String = row.try_get("uuid").map_err(map_sqlx_error)?;
    let data: Json<EntrypointData> = row.try_get("entrypoint_data").map_err(map_sqlx_error)?;

    Ok(Entrypoint {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        uuid: parse_uuid(&uuid)?,
        user: row.try_get("owner").map_err(map_sqlx_error)?,
        name: row.try_get("entrypoint_name").map_err(map_sqlx_error)?,
        entrypoint_type: row.try_get("entrypoint_type").map_err(map_sqlx_error)?,
        data: data.0,
    })
}

pub(crate) async fn find_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    lookup: &EntrypointLookup,
) -> Result<Option<Entrypoint>, StoreError> {
    let row = match lookup {
        EntrypointLookup::Name(name) => {
            sqlx::query(
                r#"
                SELECT id, uuid, owner, entrypoint_name, entrypoint_type, entrypoint_data
                FROM entrypoints
                WHERE owner = ? AND entrypoint_name = ?
                "#,
            )
            .bind(user)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
        }
        EntrypointLookup::Uuid(uuid) => {
            sqlx::query(
                r#"
                SELECT id, uuid, owner, entrypoint_name, entrypoint_type, entrypoint_data
                FROM entrypoints
                WHERE owner = ? AND uuid = ?
                "#,
            )
            .bind(user)
            .bind(uuid.to_string())
            .fetch_optional(&mut *conn)
            .await
        }
    }
    .map_err(map_sqlx_error)?;

    row.as_ref().map(parse_entrypoint_row).transpose()
}

/// Resolve an entrypoint by name, failing `NotFound` when absent.
pub(crate) async fn require_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
) -> Result<Entrypoint, StoreError> {
    find_entrypoint(conn, user, &EntrypointLookup::Name(entrypoint_name.to_string()))
        .await?
        .ok_or_else(|| {
            StoreError::NotFound(format!(
                "entrypoint '{}' for user '{}'",
                entrypoint_name, user
            ))
        })
}

pub(crate) async fn create_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
    entrypoint_type: &str,
    entrypoint_data: &EntrypointData,
    context_names: &[String],
) -> Result<EntrypointUuid, StoreError> {
    let uuid = EntrypointUuid::new();

    let result = sqlx::query(
        r#"
        INSERT INTO entrypoints (uuid, owner, entrypoint_name, entrypoint_type, entrypoint_data)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(uuid.to_string())
    .bind(user)
    .bind(entrypoint_name)
    .bind(entrypoint_type)
    .bind(Json(entrypoint_data))
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::DuplicateName(format!(
                "entrypoint '{}' already exists for user '{}'",
                entrypoint_name, user
            ))
        } else {
            map_sqlx_error(e)
        }
    })?;

    let entrypoint_id = result.last_insert_rowid();

    // Resolve every name before inserting any association.
    let unique_names: BTreeSet<&str> = context_names.iter().map(String::as_str).collect();
    let mut context_ids = Vec::with_capacity(unique_names.len());
    for context_name in unique_names {
        context_ids.push(resolve_context(conn, context_name).await?.id);
    }

    if !context_ids.is_empty() {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT INTO entrypoint_contexts (entrypoint_id, context_id) ",
        );
        query.push_values(context_ids, |mut row, context_id| {
            row.push_bind(entrypoint_id).push_bind(context_id);
        });
        query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    }

    Ok(uuid)
}

pub(crate) async fn retrieve_one(
    conn: &mut SqliteConnection,
    user: &str,
    lookup: &EntrypointLookup,
) -> Result<EntrypointRecord, StoreError> {
    let entrypoint = find_entrypoint(conn, user, lookup)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("entrypoint {} for user '{}'", lookup, user)))?;

    let context_names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT c.context_name
        FROM entrypoint_contexts ec
        JOIN contexts c ON c.id = ec.context_id
        WHERE ec.entrypoint_id = ?
        ORDER BY c.context_name
        "#,
    )
    .bind(entrypoint.id)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(EntrypointRecord {
        uuid: entrypoint.uuid,
        entrypoint_name: entrypoint.name,
        entrypoint_type: entrypoint.entrypoint_type,
        entrypoint_data: entrypoint.data,
        context_names,
    })
}

pub(crate) async fn retrieve_many(
    conn: &mut SqliteConnection,
    user: &str,
    filter: &EntrypointFilter,
) -> Result<EntrypointListing, StoreError> {
    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT c.context_name, e.uuid, e.entrypoint_name, e.entrypoint_type,
               e.entrypoint_data, ec.selecting_user
        FROM entrypoints e
        JOIN entrypoint_contexts ec ON ec.entrypoint_id = e.id
        JOIN contexts c ON c.id = ec.context_id
        WHERE e.owner = "#,
    );
    query.push_bind(user);
    if let Some(entrypoint_type) = &filter.entrypoint_type {
        query.push(" AND e.entrypoint_type = ").push_bind(entrypoint_type);
    }
    if let Some(context_name) = &filter.context_name {
        query.push(" AND c.context_name = ").push_bind(context_name);
    }
    query.push(" ORDER BY c.context_name, e.entrypoint_type, e.entrypoint_name");

    let rows = query
        .build()
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    let mut listing = EntrypointListing::new();
    for row in rows {
        let context_name: String = row.try_get("context_name").map_err(map_sqlx_error)?;
        let entrypoint_type: String = row.try_get("entrypoint_type").map_err(map_sqlx_error)?;
        let uuid: String = row.try_get("uuid").map_err(map_sqlx_error)?;
        let data: Json<EntrypointData> = row.try_get("entrypoint_data").map_err(map_sqlx_error)?;
        let selecting_user: Option<String> =
            row.try_get("selecting_user").map_err(map_sqlx_error)?;

        listing
            .entry(context_name)
            .or_default()
            .entry(entrypoint_type)
            .or_default()
            .push(ListedEntrypoint {
                uuid: parse_uuid(&uuid)?,
                entrypoint_name: row.try_get("entrypoint_name").map_err(map_sqlx_error)?,
                entrypoint_data: data.0,
                selected: selecting_user.as_deref() == Some(user),
            });
    }

    Ok(listing)
}

pub(crate) async fn update_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
    entrypoint_type: &str,
    entrypoint_data: &EntrypointData,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE entrypoints
        SET entrypoint_type = ?, entrypoint_data = ?
        WHERE owner = ? AND entrypoint_name = ?
        "#,
    )
    .bind(entrypoint_type)
    .bind(Json(entrypoint_data))
    .bind(user)
    .bind(entrypoint_name)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "entrypoint '{}' for user '{}'",
            entrypoint_name, user
        )));
    }
    Ok(())
}

pub(crate) async fn update_entrypoint_by_uuid(
    conn: &mut SqliteConnection,
    user: &str,
    uuid: EntrypointUuid,
    entrypoint_name: &str,
    entrypoint_data: &EntrypointData,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE entrypoints
        SET entrypoint_name = ?, entrypoint_data = ?
        WHERE owner = ? AND uuid = ?
        "#,
    )
    .bind(entrypoint_name)
    .bind(Json(entrypoint_data))
    .bind(user)
    .bind(uuid.to_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::DuplicateName(format!(
                "entrypoint '{}' already exists for user '{}'",
                entrypoint_name, user
            ))
        } else {
            map_sqlx_error(e)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "entrypoint uuid {} for user '{}'",
            uuid, user
        )));
    }
    Ok(())
}

pub(crate) async fn tag_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
    context_name: &str,
) -> Result<(), StoreError> {
    let entrypoint = require_entrypoint(conn, user, entrypoint_name).await?;
    let context = resolve_context(conn, context_name).await?;

    let result = sqlx::query(
        "INSERT INTO entrypoint_contexts (entrypoint_id, context_id) VALUES (?, ?)",
    )
    .bind(entrypoint.id)
    .bind(context.id)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        // Already tagged
        Err(e) if is_unique_violation(&e) => Ok(()),
        Err(e) => Err(map_sqlx_error(e)),
    }
}

pub(crate) async fn untag_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
    context_name: &str,
) -> Result<(), StoreError> {
    let entrypoint = require_entrypoint(conn, user, entrypoint_name).await?;
    let context = resolve_context(conn, context_name).await?;

    let result = sqlx::query(
        "DELETE FROM entrypoint_contexts WHERE entrypoint_id = ? AND context_id = ?",
    )
    .bind(entrypoint.id)
    .bind(context.id)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "entrypoint '{}' is not tagged with context '{}'",
            entrypoint_name, context_name
        )));
    }
    Ok(())
}

pub(crate) async fn delete_entrypoint(
    conn: &mut SqliteConnection,
    user: &str,
    entrypoint_name: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM entrypoints WHERE owner = ? AND entrypoint_name = ?")
        .bind(user)
        .bind(entrypoint_name)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "entrypoint '{}' for user '{}'",
            entrypoint_name, user
        )));
    }
    Ok(())
}

pub(crate) async fn delete_entrypoint_by_uuid(
    conn: &mut SqliteConnection,
    user: &str,
    uuid: EntrypointUuid,
) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM entrypoints WHERE owner = ? AND uuid = ?")
        .bind(user)
        .bind(uuid.to_string())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "entrypoint uuid {} for user '{}'",
            uuid, user
        )));
    }
    Ok(())
}
