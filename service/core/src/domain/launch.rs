// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Launch
//!
//! What the hub receives when it asks how to start a user's server.

use serde::{Deserialize, Serialize};

/// Options the hub passes when requesting a launch command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LaunchOptions {
    /// The hub spawns through a batch scheduler wrapper
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub batchspawner: bool,
}

/// Argv-style command plus the optional batch-mode override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchCommand {
    pub cmd: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batchspawner_singleuser_cmd: Option<String>,
}

impl LaunchCommand {
    pub fn new(cmd: Vec<String>) -> Self {
        Self {
            cmd,
            batchspawner_singleuser_cmd: None,
        }
    }

    pub fn with_batch_command(mut self, command: impl Into<String>) -> Self {
        self.batchspawner_singleuser_cmd = Some(command.into());
        self
    }
}

/// Accepts "true"/"yes"/"1" (any case) as set; anything else is unset.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1")
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_flag(&raw))
}
