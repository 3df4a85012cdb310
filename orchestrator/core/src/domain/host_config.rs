// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Host Configuration Types
//
// Defines the configuration schema for an eris host, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Locations of service, chain and action definition files
// - Container runtime connection settings
// - Default container instance number

use crate::domain::config::DefinitionKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "eris/v1";
pub const KIND: &str = "HostConfig";

/// Top-level Kubernetes-style host configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfigManifest {
    /// API version (must be "eris/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "HostConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: HostConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Host configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfigSpec {
    /// Root of the eris tree (default: ~/.eris)
    #[serde(default = "default_eris_dir")]
    pub eris_dir: PathBuf,

    /// Service definitions (default: <eris_dir>/services)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_dir: Option<PathBuf>,

    /// Chain definitions (default: <eris_dir>/blockchains)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains_dir: Option<PathBuf>,

    /// Action definitions (default: <eris_dir>/actions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_dir: Option<PathBuf>,

    #[serde(default)]
    pub docker: DockerConfig,

    /// Instance number used in container names when none is given
    #[serde(default = "default_instance_number")]
    pub default_instance_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Custom Docker socket path (auto-detect when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<String>,

    /// Grace period before a stopped container is killed
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_seconds: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            stop_timeout_seconds: default_stop_timeout(),
        }
    }
}

impl Default for HostConfigSpec {
    fn default() -> Self {
        Self {
            eris_dir: default_eris_dir(),
            services_dir: None,
            chains_dir: None,
            actions_dir: None,
            docker: DockerConfig::default(),
            default_instance_number: default_instance_number(),
        }
    }
}

impl Default for HostConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "eris-host".to_string(),
                version: None,
            },
            spec: HostConfigSpec::default(),
        }
    }
}

impl HostConfigSpec {
    /// Directory holding definitions of the given kind
    pub fn definitions_dir(&self, kind: DefinitionKind) -> PathBuf {
        let (explicit, default) = match kind {
            DefinitionKind::Service => (&self.services_dir, "services"),
            DefinitionKind::Chain => (&self.chains_dir, "blockchains"),
            DefinitionKind::Action => (&self.actions_dir, "actions"),
        };
        explicit
            .clone()
            .unwrap_or_else(|| self.eris_dir.join(default))
    }
}

impl HostConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ERIS_CONFIG_PATH environment variable
    /// 2. ./eris-config.yaml (working directory)
    /// 3. ~/.eris/config.yaml (user home)
    /// 4. /etc/eris/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ERIS_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./eris-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".eris").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/eris/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("ERIS_DIR") {
            if !dir.trim().is_empty() {
                tracing::info!("Environment override: ERIS_DIR={}", dir);
                self.spec.eris_dir = PathBuf::from(dir);
            }
        }

        if let Ok(socket) = std::env::var("ERIS_DOCKER_SOCKET") {
            if !socket.trim().is_empty() {
                tracing::info!("Environment override: ERIS_DOCKER_SOCKET={}", socket);
                self.spec.docker.socket_path = Some(socket);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.default_instance_number == 0 {
            anyhow::bail!("spec.default_instance_number must be at least 1");
        }

        if self.spec.eris_dir.as_os_str().is_empty() {
            anyhow::bail!("spec.eris_dir cannot be empty");
        }

        Ok(())
    }
}

fn default_eris_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".eris"))
        .unwrap_or_else(|| PathBuf::from(".eris"))
}

fn default_instance_number() -> u32 {
    1
}

fn default_stop_timeout() -> u64 {
    10
}
