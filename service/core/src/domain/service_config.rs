// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the YAML configuration for the entrypoint service:
// - Database location and HTTP bind settings
// - Shared secret the hub presents when asking for launch commands
// - Contexts created at startup
// - Entrypoint types instantiated into the registry

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// sqlx SQLite connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for the hub and management API ("env:VAR" supported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Notebook server executable appended to launch commands
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Contexts created (idempotently) at startup
    #[serde(default)]
    pub contexts: Vec<ContextConfig>,

    #[serde(default)]
    pub entrypoint_types: Vec<EntrypointTypeConfig>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub name: String,
}

/// One registry entry, keyed by `kind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrypointTypeConfig {
    /// Administrator-managed wrapper scripts
    TrustedScript { scripts: Vec<String> },

    /// Administrator-managed environment bin directories
    TrustedPath { paths: Vec<String> },

    /// Container images offered by an external inventory
    ContainerImage(ContainerImageConfig),
}

impl EntrypointTypeConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TrustedScript { .. } => "trusted_script",
            Self::TrustedPath { .. } => "trusted_path",
            Self::ContainerImage(_) => "container_image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerImageConfig {
    /// Base URL of the image inventory; `/list/{user}` is appended
    pub api_url: String,

    /// Sent verbatim as the Authorization header ("env:VAR" supported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Only images whose ENV list contains this entry are offered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_env: Option<String>,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://entrypoint.db".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8889
}

fn default_executable() -> String {
    "jupyter-labhub".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            bind_address: default_bind_address(),
            port: default_port(),
            api_token: None,
            executable: default_executable(),
            contexts: Vec::new(),
            entrypoint_types: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. ENTRYPOINT_CONFIG_PATH environment variable
    /// 2. ./entrypoint-config.yaml (working directory)
    /// 3. ~/.entrypoint/config.yaml (user home)
    /// 4. /etc/entrypoint/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ENTRYPOINT_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./entrypoint-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".entrypoint").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/entrypoint/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ENTRYPOINT_DATABASE_URL") {
            tracing::info!("Environment override: ENTRYPOINT_DATABASE_URL");
            self.database_url = val;
        }

        if let Ok(val) = std::env::var("ENTRYPOINT_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: ENTRYPOINT_PORT={}", port);
                    self.port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for ENTRYPOINT_PORT: '{}'. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("ENTRYPOINT_API_TOKEN") {
            tracing::info!("Environment override: ENTRYPOINT_API_TOKEN");
            self.api_token = Some(val);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for context in &self.contexts {
            if context.name.trim().is_empty() {
                anyhow::bail!("Context names must not be empty");
            }
            if !seen.insert(context.name.as_str()) {
                anyhow::bail!("Context '{}' is declared more than once", context.name);
            }
        }

        let mut kinds = HashSet::new();
        for entrypoint_type in &self.entrypoint_types {
            if !kinds.insert(entrypoint_type.kind()) {
                anyhow::bail!(
                    "Entrypoint type '{}' is configured more than once",
                    entrypoint_type.kind()
                );
            }
            match entrypoint_type {
                EntrypointTypeConfig::TrustedScript { scripts } if scripts.is_empty() => {
                    anyhow::bail!("trusted_script requires at least one script");
                }
                EntrypointTypeConfig::TrustedPath { paths } if paths.is_empty() => {
                    anyhow::bail!("trusted_path requires at least one path");
                }
                EntrypointTypeConfig::ContainerImage(image) if image.api_url.is_empty() => {
                    anyhow::bail!("container_image requires api_url");
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn context_names(&self) -> Vec<String> {
        self.contexts.iter().map(|c| c.name.clone()).collect()
    }

    pub fn resolved_api_token(&self) -> anyhow::Result<Option<String>> {
        resolve_secret(&self.api_token)
    }
}

/// Resolve a secret from config (supports "env:VAR_NAME" syntax)
pub fn resolve_secret(value: &Option<String>) -> anyhow::Result<Option<String>> {
    match value {
        Some(v) => match v.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name)
                .map(Some)
                .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
            None => Ok(Some(v.clone())),
        },
        None => Ok(None),
    }
}
