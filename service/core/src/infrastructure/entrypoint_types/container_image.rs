// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Container Image
//!
//! Entrypoints that run the notebook server inside a container image. The
//! set of images is not known up front: it is asked of an external inventory
//! per user, both to offer choices and to validate a submission.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::domain::entrypoint::EntrypointData;
use crate::domain::entrypoint_type::{required_str, EntrypointType, RenderError, ValidationError};
use crate::domain::launch::{LaunchCommand, LaunchOptions};
use crate::domain::schema::{DataSchema, FieldSpec, SchemaError};
use crate::infrastructure::image_inventory::ImageInventoryClient;

pub const TYPE_NAME: &str = "container_image";

const IMAGE_FIELD: &str = "image";

pub struct ContainerImageType {
    executable: String,
    schema: DataSchema,
    inventory: Arc<ImageInventoryClient>,
}

impl ContainerImageType {
    pub fn new(
        inventory: Arc<ImageInventoryClient>,
        executable: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let schema = DataSchema::builder()
            .field(FieldSpec::string(IMAGE_FIELD))
            .build()?;

        Ok(Self {
            executable: executable.into(),
            schema,
            inventory,
        })
    }
}

#[async_trait]
impl EntrypointType for ContainerImageType {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn display_name(&self) -> &str {
        "container image"
    }

    fn description(&self) -> &str {
        "Start a Jupyter notebook server using a container image loaded on the target system."
    }

    fn schema(&self) -> &DataSchema {
        &self.schema
    }

    fn spawn_args(
        &self,
        data: &EntrypointData,
        options: &LaunchOptions,
    ) -> Result<LaunchCommand, RenderError> {
        let image = required_str(data, IMAGE_FIELD)?;

        if options.batchspawner {
            Ok(LaunchCommand::new(vec![self.executable.clone()]).with_batch_command(format!(
                "shifter --image={} batchspawner-singleuser",
                image
            )))
        } else {
            Ok(LaunchCommand::new(vec![
                "shifter".to_string(),
                format!("--image={}", image),
                self.executable.clone(),
            ]))
        }
    }

    /// The image must be one the inventory currently offers this user.
    async fn validation_hook(
        &self,
        user: &str,
        data: &EntrypointData,
    ) -> Result<(), ValidationError> {
        let image = required_str(data, IMAGE_FIELD).map_err(|_| ValidationError)?;

        let images = self.inventory.images_for(user).await.map_err(|e| {
            warn!(user = %user, error = %e, "Image inventory unavailable during validation");
            ValidationError
        })?;

        if images.iter().any(|candidate| candidate == image) {
            Ok(())
        } else {
            Err(ValidationError)
        }
    }

    async fn field_options(&self, user: &str, field: &str) -> Option<Vec<String>> {
        if field == IMAGE_FIELD {
            Some(self.inventory.images_or_empty(user).await)
        } else {
            self.schema.field(field).and_then(|f| f.choices.clone())
        }
    }
}
