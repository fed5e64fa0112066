// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Entrypoint Type Capability
//!
//! An entrypoint type is the pluggable definition of one kind of entrypoint.
//! It owns three things:
//!
//! - the [`DataSchema`] payloads of this kind must satisfy,
//! - an async validation hook that may consult an external inventory,
//! - a pure rendering of stored data into a [`LaunchCommand`].
//!
//! Implementations live in `crate::infrastructure::entrypoint_types` and are
//! looked up by `type_name` through the registry.
//!
//! ## Validation errors
//!
//! [`ValidationError`] deliberately carries nothing. Whatever went wrong, the
//! caller only learns that validation failed; submitted values are never
//! echoed back.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::entrypoint::EntrypointData;
use crate::domain::launch::{LaunchCommand, LaunchOptions};
use crate::domain::schema::DataSchema;

/// Opaque validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("validation failed")]
pub struct ValidationError;

/// Stored data could not be rendered by its type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Entrypoint data is missing string field '{0}'")]
    MissingField(&'static str),
}

/// Domain interface for entrypoint kinds
#[async_trait]
pub trait EntrypointType: Send + Sync {
    /// Registry key, also stored on every entrypoint row
    fn type_name(&self) -> &str;

    /// Human-friendly label
    fn display_name(&self) -> &str {
        self.type_name()
    }

    fn description(&self) -> &str {
        ""
    }

    fn schema(&self) -> &DataSchema;

    /// Render stored data into the hub's launch command
    fn spawn_args(
        &self,
        data: &EntrypointData,
        options: &LaunchOptions,
    ) -> Result<LaunchCommand, RenderError>;

    /// Type-specific checks beyond the schema
    async fn validation_hook(
        &self,
        _user: &str,
        _data: &EntrypointData,
    ) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Allowed values for `field`, or `None` when the field is free text
    async fn field_options(&self, _user: &str, field: &str) -> Option<Vec<String>> {
        self.schema().field(field).and_then(|f| f.choices.clone())
    }

    /// Schema validation followed by the hook
    async fn validate(&self, user: &str, data: &EntrypointData) -> Result<(), ValidationError> {
        self.schema().validate(data)?;
        self.validation_hook(user, data).await
    }

    fn describe(&self) -> TypeSummary {
        TypeSummary {
            type_name: self.type_name().to_string(),
            display_name: self.display_name().to_string(),
            description: self.description().to_string(),
            schema: self.schema().document().clone(),
        }
    }
}

/// Serializable description of a registered type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub type_name: String,
    pub display_name: String,
    pub description: String,
    pub schema: Value,
}

/// Read a required string field from stored data.
pub fn required_str<'a>(
    data: &'a EntrypointData,
    field: &'static str,
) -> Result<&'a str, RenderError> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or(RenderError::MissingField(field))
}
