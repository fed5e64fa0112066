// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Launch Resolver
//!
//! The read path the hub uses before starting a server: look up the user's
//! selection for a context and render it with its entrypoint type.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::entrypoint_type::RenderError;
use crate::domain::launch::{LaunchCommand, LaunchOptions};
use crate::domain::repository::{SelectionRepository, StoreError};
use crate::infrastructure::entrypoint_types::EntrypointTypeRegistry;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub struct LaunchResolver {
    selections: Arc<dyn SelectionRepository>,
    registry: Arc<EntrypointTypeRegistry>,
}

impl LaunchResolver {
    pub fn new(
        selections: Arc<dyn SelectionRepository>,
        registry: Arc<EntrypointTypeRegistry>,
    ) -> Self {
        Self {
            selections,
            registry,
        }
    }

    /// `Ok(None)` when the user has no usable selection in `context_name`.
    pub async fn resolve(
        &self,
        user: &str,
        context_name: &str,
        options: &LaunchOptions,
    ) -> Result<Option<LaunchCommand>, LaunchError> {
        let selection = match self.selections.retrieve_selection(user, context_name).await {
            Ok(selection) => selection,
            Err(StoreError::NotFound(_)) => {
                debug!(user = %user, context = %context_name, "No selection");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(entrypoint_type) = self.registry.get(&selection.entrypoint_type) else {
            warn!(
                user = %user,
                entrypoint_type = %selection.entrypoint_type,
                "Selected entrypoint has a type that is no longer registered"
            );
            return Ok(None);
        };

        let command = entrypoint_type.spawn_args(&selection.entrypoint_data, options)?;
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entrypoint::SelectedEntrypoint;
    use crate::infrastructure::entrypoint_types::TrustedScriptType;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedSelection(Option<SelectedEntrypoint>);

    #[async_trait]
    impl SelectionRepository for FixedSelection {
        async fn update_selection(&self, _: &str, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn retrieve_selection(
            &self,
            _user: &str,
            context_name: &str,
        ) -> Result<SelectedEntrypoint, StoreError> {
            self.0
                .clone()
                .ok_or_else(|| StoreError::NotFound(context_name.to_string()))
        }

        async fn delete_selection(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn registry() -> Arc<EntrypointTypeRegistry> {
        let mut registry = EntrypointTypeRegistry::new();
        registry
            .register(Arc::new(
                TrustedScriptType::new(vec!["/opt/wrap.sh".into()], "jupyter-labhub").unwrap(),
            ))
            .unwrap();
        Arc::new(registry)
    }

    fn selection(entrypoint_type: &str) -> SelectedEntrypoint {
        SelectedEntrypoint {
            entrypoint_type: entrypoint_type.to_string(),
            entrypoint_data: json!({"entrypoint_name": "wrap", "script": "/opt/wrap.sh"})
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_renders_selection() {
        let resolver = LaunchResolver::new(
            Arc::new(FixedSelection(Some(selection("trusted_script")))),
            registry(),
        );
        let command = resolver
            .resolve("alice", "cori", &LaunchOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(command.cmd, vec!["/opt/wrap.sh", "jupyter-labhub"]);
    }

    #[tokio::test]
    async fn test_no_selection_is_none() {
        let resolver = LaunchResolver::new(Arc::new(FixedSelection(None)), registry());
        let command = resolver
            .resolve("alice", "cori", &LaunchOptions::default())
            .await
            .unwrap();
        assert!(command.is_none());
    }

    #[tokio::test]
    async fn test_unregistered_type_is_none() {
        let resolver = LaunchResolver::new(
            Arc::new(FixedSelection(Some(selection("conda")))),
            registry(),
        );
        let command = resolver
            .resolve("alice", "cori", &LaunchOptions { batchspawner: true })
            .await
            .unwrap();
        assert!(command.is_none());
    }
}
