// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::definition::ServiceSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during container runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to connect to container runtime: {0}")]
    ConnectionFailed(String),

    #[error("Failed to pull image {image}: {error}")]
    PullFailed { image: String, error: String },

    #[error("Failed to create container {name}: {error}")]
    CreateFailed { name: String, error: String },

    #[error("Failed to start container {name}: {error}")]
    StartFailed { name: String, error: String },

    #[error("Failed to stop container {name}: {error}")]
    StopFailed { name: String, error: String },

    #[error("Failed to remove container {name}: {error}")]
    RemoveFailed { name: String, error: String },

    #[error("Failed to rename container {name}: {error}")]
    RenameFailed { name: String, error: String },

    #[error("Failed to exec in container {name}: {error}")]
    ExecFailed { name: String, error: String },

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Container runtime request failed: {0}")]
    RequestFailed(String),
}

/// Live state of a named container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerState {
    pub name: String,
    pub image: String,
    pub status: String,
    pub running: bool,
}

/// Captured result of a command run inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
}

/// Named-container operations the core needs from a container runtime.
///
/// Implemented by the Docker adapter in production and by in-memory fakes in
/// tests.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// `Ok(None)` when no container has that name.
    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerState>, RuntimeError>;

    async fn image_exists(&self, image: &str) -> Result<bool, RuntimeError>;

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError>;

    /// Create (but do not start) a container from a resolved spec.
    async fn create_container(&self, name: &str, spec: &ServiceSpec) -> Result<(), RuntimeError>;

    async fn start_container(&self, name: &str) -> Result<(), RuntimeError>;

    async fn stop_container(&self, name: &str, timeout: Duration) -> Result<(), RuntimeError>;

    async fn remove_container(&self, name: &str, remove_volumes: bool) -> Result<(), RuntimeError>;

    async fn rename_container(&self, name: &str, new_name: &str) -> Result<(), RuntimeError>;

    /// Names of running containers, or of all containers when `all` is set.
    async fn list_container_names(&self, all: bool) -> Result<Vec<String>, RuntimeError>;

    /// Combined stdout/stderr log of a container; `tail` limits it to the last
    /// n lines.
    async fn container_logs(&self, name: &str, tail: Option<usize>) -> Result<String, RuntimeError>;

    /// Run `cmd` (argv form) in a running container and wait for it.
    async fn exec_in_container(&self, name: &str, cmd: &[String]) -> Result<ExecOutput, RuntimeError>;
}

/// Brings declared dependencies of an action to a running state.
///
/// Both operations are idempotent: starting something already running is a
/// successful no-op.
#[async_trait]
pub trait DependencyStarter: Send + Sync {
    async fn start_service(&self, name: &str) -> anyhow::Result<()>;

    async fn start_chain(&self, name: &str) -> anyhow::Result<()>;
}
