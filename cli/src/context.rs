// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wiring shared by every command: configuration, the definition store and
//! the services built on them.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use eris_core::application::{ActionResolver, ActionRunner, ContainerLifecycleService};
use eris_core::domain::host_config::HostConfigManifest;
use eris_core::infrastructure::{DockerRuntime, FileDefinitionStore, ShellCommandRunner};

pub struct ErisContext {
    pub config: HostConfigManifest,
    pub store: Arc<FileDefinitionStore>,
}

impl ErisContext {
    /// Load configuration (explicit path, discovery, or defaults) and open
    /// the definition store it points at.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = HostConfigManifest::load_or_default(config_path)
            .context("Failed to load configuration")?;
        config
            .validate()
            .context("Configuration validation failed")?;

        let store = Arc::new(FileDefinitionStore::from_config(&config.spec));
        debug!("Using eris directory {}", config.spec.eris_dir.display());
        Ok(Self { config, store })
    }

    /// Lifecycle service bound to the configured Docker daemon.
    pub fn lifecycle(&self) -> Result<ContainerLifecycleService> {
        let runtime = DockerRuntime::new(self.config.spec.docker.socket_path.clone())
            .context("Failed to initialize Docker runtime")?;

        Ok(
            ContainerLifecycleService::new(self.store.clone(), Arc::new(runtime))
                .with_instance_number(self.config.spec.default_instance_number)
                .with_stop_timeout(Duration::from_secs(
                    self.config.spec.docker.stop_timeout_seconds,
                )),
        )
    }

    pub fn action_resolver(&self) -> ActionResolver {
        ActionResolver::new(self.store.clone())
    }

    pub fn action_runner(&self) -> Result<ActionRunner> {
        Ok(ActionRunner::new(
            Arc::new(self.lifecycle()?),
            Arc::new(ShellCommandRunner::new()),
        ))
    }
}
