// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Validation Pipeline
//!
//! Schema validation followed by the type's own hook, resolved through the
//! registry. Runs before any store transaction is opened, so inventory
//! lookups never hold a database lock.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::entrypoint::EntrypointData;
use crate::domain::entrypoint_type::{EntrypointType, ValidationError};
use crate::infrastructure::entrypoint_types::EntrypointTypeRegistry;

#[derive(Clone)]
pub struct ValidationPipeline {
    registry: Arc<EntrypointTypeRegistry>,
}

impl ValidationPipeline {
    pub fn new(registry: Arc<EntrypointTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<EntrypointTypeRegistry> {
        &self.registry
    }

    /// Validate `data` as an entrypoint of `type_name` owned by `user`.
    ///
    /// Returns the resolved type on success. An unregistered type name fails
    /// the same way malformed data does.
    pub async fn validate(
        &self,
        user: &str,
        type_name: &str,
        data: &EntrypointData,
    ) -> Result<Arc<dyn EntrypointType>, ValidationError> {
        let Some(entrypoint_type) = self.registry.get(type_name) else {
            warn!(user = %user, "Validation requested for unregistered entrypoint type");
            return Err(ValidationError);
        };

        if let Err(e) = entrypoint_type.validate(user, data).await {
            // Never log submitted values.
            warn!(user = %user, entrypoint_type = %type_name, "Entrypoint data failed validation");
            return Err(e);
        }

        debug!(user = %user, entrypoint_type = %type_name, "Entrypoint data validated");
        Ok(entrypoint_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::entrypoint_types::TrustedPathType;
    use serde_json::json;

    fn pipeline() -> ValidationPipeline {
        let mut registry = EntrypointTypeRegistry::new();
        registry
            .register(Arc::new(
                TrustedPathType::new(vec!["/opt/envs/a/bin".into()], "jupyter-labhub").unwrap(),
            ))
            .unwrap();
        ValidationPipeline::new(Arc::new(registry))
    }

    fn data(value: serde_json::Value) -> EntrypointData {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_valid_data_resolves_type() {
        let resolved = pipeline()
            .validate(
                "alice",
                "trusted_path",
                &data(json!({"entrypoint_name": "a", "path": "/opt/envs/a/bin"})),
            )
            .await
            .unwrap();
        assert_eq!(resolved.type_name(), "trusted_path");
    }

    #[tokio::test]
    async fn test_unknown_type_fails_validation() {
        let result = pipeline()
            .validate("alice", "conda", &data(json!({"entrypoint_name": "a"})))
            .await;
        assert!(matches!(result, Err(ValidationError)));
    }

    #[tokio::test]
    async fn test_error_does_not_echo_input() {
        let result = pipeline()
            .validate(
                "alice",
                "trusted_path",
                &data(json!({"entrypoint_name": "<script>", "path": "/tmp/evil"})),
            )
            .await;
        let message = result.err().unwrap().to_string();
        assert_eq!(message, "validation failed");
    }
}
