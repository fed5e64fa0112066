// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Entrypoint Data Schema
//!
//! Each entrypoint type declares the complete set of fields its payload must
//! carry. The schema is assembled once, compiled to a JSON Schema validator,
//! and never mutated afterwards.
//!
//! Every declared field is required, no other field is accepted, and the
//! property count must match exactly. `entrypoint_name` is always present.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::entrypoint::{EntrypointData, ENTRYPOINT_NAME_FIELD};
use crate::domain::entrypoint_type::ValidationError;

/// A single string field of an entrypoint payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    /// Closed set of allowed values, if any
    pub choices: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            choices: None,
        }
    }

    pub fn choice(name: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            name: name.into(),
            choices: Some(choices),
        }
    }

    fn to_property(&self) -> Value {
        match &self.choices {
            Some(choices) => json!({ "type": "string", "enum": choices }),
            None => json!({ "type": "string" }),
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Field declared twice: {0}")]
    DuplicateField(String),

    #[error("Field '{0}' has an empty choice list")]
    EmptyChoices(String),

    #[error("Schema failed to compile: {0}")]
    Compile(String),
}

/// Builder that starts from the base field set.
#[derive(Debug, Clone)]
pub struct DataSchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl DataSchemaBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<DataSchema, SchemaError> {
        let mut properties = Map::new();
        let mut required = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            if properties.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if matches!(&field.choices, Some(choices) if choices.is_empty()) {
                return Err(SchemaError::EmptyChoices(field.name.clone()));
            }
            properties.insert(field.name.clone(), field.to_property());
            required.push(Value::String(field.name.clone()));
        }

        let count = self.fields.len();
        let document = json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
            "minProperties": count,
            "maxProperties": count,
        });

        let validator = jsonschema::validator_for(&document)
            .map_err(|e| SchemaError::Compile(e.to_string()))?;

        Ok(DataSchema {
            fields: self.fields,
            document,
            validator,
        })
    }
}

/// Immutable, compiled schema for one entrypoint type.
pub struct DataSchema {
    fields: Vec<FieldSpec>,
    document: Value,
    validator: jsonschema::Validator,
}

impl DataSchema {
    /// Start from the base fields every entrypoint shares.
    pub fn builder() -> DataSchemaBuilder {
        DataSchemaBuilder {
            fields: vec![FieldSpec::string(ENTRYPOINT_NAME_FIELD)],
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The JSON Schema document, as served to form renderers.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Structural validation. The error never carries the submitted data.
    pub fn validate(&self, data: &EntrypointData) -> Result<(), ValidationError> {
        let instance = Value::Object(data.clone());
        if self.validator.is_valid(&instance) {
            Ok(())
        } else {
            Err(ValidationError)
        }
    }
}

impl std::fmt::Debug for DataSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSchema")
            .field("fields", &self.fields)
            .finish()
    }
}
