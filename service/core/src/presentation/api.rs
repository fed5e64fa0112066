// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP API
//!
//! Thin JSON surface over the application services.
//!
//! | Route | Caller |
//! |-------|--------|
//! | `GET /health` | anyone |
//! | `GET /api/hub/users/{user}/selections/{context}` | the hub, before spawning |
//! | `/api/mgmt/...` | the management front end, behind an authenticating proxy |
//!
//! Every `/api` route requires the shared service token, as either
//! `Authorization: token <t>` or `Authorization: Bearer <t>`.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::{EntrypointManager, LaunchError, LaunchResolver, ManagerError};
use crate::domain::entrypoint::{EntrypointData, EntrypointFilter, EntrypointLookup, EntrypointUuid};
use crate::domain::launch::LaunchOptions;
use crate::domain::repository::StoreError;

pub struct AppState {
    pub manager: Arc<EntrypointManager>,
    pub launcher: Arc<LaunchResolver>,
    pub auth: TokenAuth,
}

pub fn app(state: Arc<AppState>) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), require_token);

    let hub = Router::new()
        .route("/users/{user}/selections/{context}", get(hub_launch_command))
        .route_layer(auth.clone());

    let mgmt = Router::new()
        .route("/contexts", get(list_contexts))
        .route("/types", get(list_types))
        .route("/users/{user}/types/{entrypoint_type}/options", get(field_options))
        .route(
            "/users/{user}/entrypoints",
            get(list_entrypoints).post(create_entrypoint),
        )
        .route("/users/{user}/entrypoint", get(get_entrypoint))
        .route(
            "/users/{user}/entrypoints/{uuid}",
            axum::routing::put(update_entrypoint).delete(delete_entrypoint),
        )
        .route(
            "/users/{user}/selections/{context}",
            get(get_selection).put(select_entrypoint).delete(clear_selection),
        )
        .route_layer(auth);

    let api = Router::new().nest("/hub", hub).nest("/mgmt", mgmt);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Authentication
// ============================================================================

/// Shared-secret check for callers of the service.
#[derive(Clone)]
pub struct TokenAuth {
    token: Option<String>,
}

impl TokenAuth {
    /// With no token configured every request is refused.
    pub fn new(token: Option<String>) -> Self {
        if token.is_none() {
            warn!("No api_token configured - all API requests will be refused");
        }
        Self { token }
    }

    pub fn verify(&self, authorization: Option<&str>) -> Result<(), ApiError> {
        let expected = self.token.as_deref().ok_or(ApiError::Forbidden)?;
        let provided = authorization
            .and_then(parse_authorization)
            .ok_or(ApiError::Forbidden)?;

        if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Accepts `token <t>` and `Bearer <t>`.
fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}

async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.auth.verify(header)?;
    Ok(next.run(request).await)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed")]
    Validation,

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::DuplicateName(msg)
            | StoreError::UnknownReference(msg)
            | StoreError::InvalidLookup(msg) => ApiError::BadRequest(msg),
            StoreError::SelectionConflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => {
                error!("Store failure: {}", msg);
                ApiError::Internal
            }
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Validation(_) => ApiError::Validation,
            ManagerError::Store(e) => e.into(),
            ManagerError::UnknownType(name) => {
                ApiError::NotFound(format!("entrypoint type '{}'", name))
            }
        }
    }
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Store(e) => e.into(),
            LaunchError::Render(e) => {
                error!("Failed to render launch command: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_uuid(raw: &str) -> Result<EntrypointUuid, ApiError> {
    EntrypointUuid::from_string(raw).map_err(|_| ApiError::BadRequest("invalid uuid".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn hub_launch_command(
    State(state): State<Arc<AppState>>,
    Path((user, context)): Path<(String, String)>,
    Query(options): Query<LaunchOptions>,
) -> Result<Response, ApiError> {
    match state.launcher.resolve(&user, &context, &options).await? {
        Some(command) => Ok(Json(command).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({}))).into_response()),
    }
}

async fn list_contexts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let contexts = state.manager.list_contexts().await?;
    Ok(Json(json!({ "contexts": contexts })))
}

async fn list_types(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "entrypoint_types": state.manager.entrypoint_types() }))
}

async fn field_options(
    State(state): State<Arc<AppState>>,
    Path((user, entrypoint_type)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let options = state.manager.field_options(&user, &entrypoint_type).await?;
    Ok(Json(options))
}

async fn list_entrypoints(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Query(filter): Query<EntrypointFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.manager.list_entrypoints(&user, &filter).await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct CreateEntrypointRequest {
    pub entrypoint_type: String,
    pub entrypoint_data: EntrypointData,
    #[serde(default)]
    pub context_names: Vec<String>,
}

async fn create_entrypoint(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(payload): Json<CreateEntrypointRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = state
        .manager
        .create_entrypoint(
            &user,
            &payload.entrypoint_type,
            payload.entrypoint_data,
            payload.context_names,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "uuid": uuid }))))
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub entrypoint_name: Option<String>,
    pub uuid: Option<String>,
}

async fn get_entrypoint(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = query.uuid.as_deref().map(parse_uuid).transpose()?;
    let lookup = EntrypointLookup::from_parts(query.entrypoint_name, uuid)?;
    let record = state.manager.get_entrypoint(&user, &lookup).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntrypointRequest {
    pub entrypoint_data: EntrypointData,
    #[serde(default)]
    pub context_names: Vec<String>,
}

async fn update_entrypoint(
    State(state): State<Arc<AppState>>,
    Path((user, uuid)): Path<(String, String)>,
    Json(payload): Json<UpdateEntrypointRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    state
        .manager
        .update_entrypoint(&user, uuid, payload.entrypoint_data, payload.context_names)
        .await?;
    Ok(Json(json!({ "uuid": uuid })))
}

async fn delete_entrypoint(
    State(state): State<Arc<AppState>>,
    Path((user, uuid)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    state.manager.delete_entrypoint_by_uuid(&user, uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_selection(
    State(state): State<Arc<AppState>>,
    Path((user, context)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = state.manager.get_selection(&user, &context).await?;
    Ok(Json(selection))
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub entrypoint_name: String,
}

async fn select_entrypoint(
    State(state): State<Arc<AppState>>,
    Path((user, context)): Path<(String, String)>,
    Json(payload): Json<SelectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .manager
        .select(&user, &payload.entrypoint_name, &context)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_selection(
    State(state): State<Arc<AppState>>,
    Path((user, context)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state.manager.clear_selection(&user, &context).await?;
    Ok(StatusCode::NO_CONTENT)
}
