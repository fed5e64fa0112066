// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Trusted Path
//!
//! Entrypoints that launch the notebook server out of an
//! administrator-managed directory, typically an environment's `bin/`.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::entrypoint::EntrypointData;
use crate::domain::entrypoint_type::{required_str, EntrypointType, RenderError};
use crate::domain::launch::{LaunchCommand, LaunchOptions};
use crate::domain::schema::{DataSchema, FieldSpec, SchemaError};

pub const TYPE_NAME: &str = "trusted_path";

const PATH_FIELD: &str = "path";

pub struct TrustedPathType {
    executable: String,
    schema: DataSchema,
}

impl TrustedPathType {
    pub fn new(paths: Vec<String>, executable: impl Into<String>) -> Result<Self, SchemaError> {
        let schema = DataSchema::builder()
            .field(FieldSpec::choice(PATH_FIELD, paths))
            .build()?;

        Ok(Self {
            executable: executable.into(),
            schema,
        })
    }
}

#[async_trait]
impl EntrypointType for TrustedPathType {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn display_name(&self) -> &str {
        "trusted path"
    }

    fn description(&self) -> &str {
        "Start a Jupyter notebook server using a staff-managed, pre-defined absolute path \
         to the \"jupyter\" executable."
    }

    fn schema(&self) -> &DataSchema {
        &self.schema
    }

    fn spawn_args(
        &self,
        data: &EntrypointData,
        options: &LaunchOptions,
    ) -> Result<LaunchCommand, RenderError> {
        let dir = Path::new(required_str(data, PATH_FIELD)?);
        let command = LaunchCommand::new(vec![dir.join(&self.executable).display().to_string()]);

        if options.batchspawner {
            Ok(command.with_batch_command(
                dir.join("batchspawner-singleuser").display().to_string(),
            ))
        } else {
            Ok(command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entrypoint_type() -> TrustedPathType {
        TrustedPathType::new(
            vec!["/opt/envs/a/bin".into(), "/opt/envs/b/bin/".into()],
            "jupyter-labhub",
        )
        .unwrap()
    }

    fn data(path: &str) -> EntrypointData {
        json!({"entrypoint_name": "env", "path": path})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_joins_executable_onto_path() {
        let command = entrypoint_type()
            .spawn_args(&data("/opt/envs/a/bin"), &LaunchOptions::default())
            .unwrap();
        assert_eq!(command.cmd, vec!["/opt/envs/a/bin/jupyter-labhub"]);
        assert_eq!(command.batchspawner_singleuser_cmd, None);
    }

    #[test]
    fn test_trailing_separator_is_not_doubled() {
        let command = entrypoint_type()
            .spawn_args(&data("/opt/envs/b/bin/"), &LaunchOptions { batchspawner: true })
            .unwrap();
        assert_eq!(command.cmd, vec!["/opt/envs/b/bin/jupyter-labhub"]);
        assert_eq!(
            command.batchspawner_singleuser_cmd.as_deref(),
            Some("/opt/envs/b/bin/batchspawner-singleuser")
        );
    }

    #[test]
    fn test_missing_field_is_a_render_error() {
        let data = json!({"entrypoint_name": "env"}).as_object().cloned().unwrap();
        assert_eq!(
            entrypoint_type().spawn_args(&data, &LaunchOptions::default()),
            Err(RenderError::MissingField("path"))
        );
    }

    #[test]
    fn test_describe() {
        let summary = entrypoint_type().describe();
        assert_eq!(summary.type_name, "trusted_path");
        assert_eq!(summary.display_name, "trusted path");
        assert_eq!(summary.schema["properties"]["path"]["enum"][0], "/opt/envs/a/bin");
    }
}
