// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Entrypoint Type Registry
//
// Instantiates the configured entrypoint types once at startup and resolves
// them by type name at request time. The registry is immutable after
// construction and shared behind an Arc.

pub mod container_image;
pub mod trusted_path;
pub mod trusted_script;

use crate::domain::entrypoint_type::{EntrypointType, TypeSummary};
use crate::domain::service_config::{EntrypointTypeConfig, ServiceConfig};
use crate::infrastructure::image_inventory::ImageInventoryClient;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub use container_image::ContainerImageType;
pub use trusted_path::TrustedPathType;
pub use trusted_script::TrustedScriptType;

/// Registry of entrypoint types keyed by type name
#[derive(Default)]
pub struct EntrypointTypeRegistry {
    types: BTreeMap<String, Arc<dyn EntrypointType>>,
}

impl EntrypointTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the registry from service configuration
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new();

        info!("Initializing entrypoint type registry");

        for type_config in &config.entrypoint_types {
            let entrypoint_type = Self::create_type(type_config, &config.executable)?;
            info!("Registered entrypoint type: {}", entrypoint_type.type_name());
            registry.register(entrypoint_type)?;
        }

        if registry.types.is_empty() {
            warn!("No entrypoint types configured - every create request will be rejected");
        }

        Ok(registry)
    }

    fn create_type(
        config: &EntrypointTypeConfig,
        executable: &str,
    ) -> anyhow::Result<Arc<dyn EntrypointType>> {
        let entrypoint_type: Arc<dyn EntrypointType> = match config {
            EntrypointTypeConfig::TrustedScript { scripts } => {
                Arc::new(TrustedScriptType::new(scripts.clone(), executable)?)
            }
            EntrypointTypeConfig::TrustedPath { paths } => {
                Arc::new(TrustedPathType::new(paths.clone(), executable)?)
            }
            EntrypointTypeConfig::ContainerImage(image_config) => {
                let inventory = ImageInventoryClient::from_config(image_config)?;
                Arc::new(ContainerImageType::new(Arc::new(inventory), executable)?)
            }
        };
        Ok(entrypoint_type)
    }

    /// Add a type; names must be unique
    pub fn register(&mut self, entrypoint_type: Arc<dyn EntrypointType>) -> anyhow::Result<()> {
        let name = entrypoint_type.type_name().to_string();
        if self.types.contains_key(&name) {
            anyhow::bail!("Entrypoint type '{}' registered twice", name);
        }
        self.types.insert(name, entrypoint_type);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn EntrypointType>> {
        self.types.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn describe(&self) -> Vec<TypeSummary> {
        self.types.values().map(|t| t.describe()).collect()
    }
}
