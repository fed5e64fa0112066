// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Trusted Script
//!
//! Entrypoints that wrap the notebook server in an administrator-managed
//! script, e.g. one that loads modules and then `exec "$@"`.

use async_trait::async_trait;

use crate::domain::entrypoint::EntrypointData;
use crate::domain::entrypoint_type::{required_str, EntrypointType, RenderError};
use crate::domain::launch::{LaunchCommand, LaunchOptions};
use crate::domain::schema::{DataSchema, FieldSpec, SchemaError};

pub const TYPE_NAME: &str = "trusted_script";

const SCRIPT_FIELD: &str = "script";

pub struct TrustedScriptType {
    executable: String,
    schema: DataSchema,
}

impl TrustedScriptType {
    /// `scripts` is the closed set of absolute script paths users may pick.
    pub fn new(scripts: Vec<String>, executable: impl Into<String>) -> Result<Self, SchemaError> {
        let schema = DataSchema::builder()
            .field(FieldSpec::choice(SCRIPT_FIELD, scripts))
            .build()?;

        Ok(Self {
            executable: executable.into(),
            schema,
        })
    }
}

#[async_trait]
impl EntrypointType for TrustedScriptType {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn display_name(&self) -> &str {
        "trusted script"
    }

    fn description(&self) -> &str {
        "Start a Jupyter notebook server using a staff-managed, pre-defined configuration \
         implemented in a wrapper script."
    }

    fn schema(&self) -> &DataSchema {
        &self.schema
    }

    fn spawn_args(
        &self,
        data: &EntrypointData,
        options: &LaunchOptions,
    ) -> Result<LaunchCommand, RenderError> {
        let script = required_str(data, SCRIPT_FIELD)?;

        if options.batchspawner {
            Ok(LaunchCommand::new(vec![self.executable.clone()])
                .with_batch_command(format!("{} batchspawner-singleuser", script)))
        } else {
            Ok(LaunchCommand::new(vec![
                script.to_string(),
                self.executable.clone(),
            ]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entrypoint_type() -> TrustedScriptType {
        TrustedScriptType::new(
            vec!["/global/common/jupyter/vasp.sh".into()],
            "jupyter-labhub",
        )
        .unwrap()
    }

    fn data() -> EntrypointData {
        json!({"entrypoint_name": "vasp", "script": "/global/common/jupyter/vasp.sh"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_renders_script_before_executable() {
        let command = entrypoint_type()
            .spawn_args(&data(), &LaunchOptions::default())
            .unwrap();
        assert_eq!(
            command.cmd,
            vec!["/global/common/jupyter/vasp.sh", "jupyter-labhub"]
        );
        assert_eq!(command.batchspawner_singleuser_cmd, None);
    }

    #[test]
    fn test_batch_mode_moves_script_into_override() {
        let command = entrypoint_type()
            .spawn_args(&data(), &LaunchOptions { batchspawner: true })
            .unwrap();
        assert_eq!(command.cmd, vec!["jupyter-labhub"]);
        assert_eq!(
            command.batchspawner_singleuser_cmd.as_deref(),
            Some("/global/common/jupyter/vasp.sh batchspawner-singleuser")
        );
    }

    #[tokio::test]
    async fn test_only_listed_scripts_validate() {
        let entrypoint_type = entrypoint_type();
        assert!(entrypoint_type.validate("alice", &data()).await.is_ok());

        let rogue = json!({"entrypoint_name": "x", "script": "/tmp/rogue.sh"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(entrypoint_type.validate("alice", &rogue).await.is_err());
    }

    #[tokio::test]
    async fn test_options_come_from_allow_list() {
        let options = entrypoint_type().field_options("alice", SCRIPT_FIELD).await;
        assert_eq!(options, Some(vec!["/global/common/jupyter/vasp.sh".to_string()]));
        assert_eq!(entrypoint_type().field_options("alice", "entrypoint_name").await, None);
    }
}
