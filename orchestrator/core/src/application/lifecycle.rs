// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Container Lifecycle Application Service
//!
//! Start, stop, update, remove, rename, inspect and exec into services and
//! chains against a container runtime.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Resolve a definition, then drive the runtime to match it
//! - **Dependencies:** `DefinitionStore`, `ContainerRuntime`
//!
//! Starting is idempotent: a running container is left alone, a stopped one is
//! started, a missing one is pulled, created and started. Service
//! dependencies are started first, each at most once per call.

use crate::application::definition_resolver::DefinitionResolver;
use crate::domain::config::{DefinitionKind, DefinitionStore, RawConfig};
use crate::domain::definition::{ServiceDefinition, ServiceOperations, ServiceSpec};
use crate::domain::naming::{
    data_container_name, primary_container_name, ContainerKind, ParsedContainerName,
};
use crate::domain::runtime::{ContainerRuntime, DependencyStarter, ExecOutput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ContainerLifecycleService {
    store: Arc<dyn DefinitionStore>,
    resolver: DefinitionResolver,
    runtime: Arc<dyn ContainerRuntime>,
    instance: u32,
    stop_timeout: Duration,
}

impl ContainerLifecycleService {
    pub fn new(store: Arc<dyn DefinitionStore>, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            resolver: DefinitionResolver::new(store.clone()),
            store,
            runtime,
            instance: 1,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_instance_number(mut self, instance: u32) -> Self {
        self.instance = instance;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &DefinitionResolver {
        &self.resolver
    }

    pub async fn start_service(&self, name: &str) -> Result<()> {
        let mut visited = HashSet::new();
        self.start_service_with(name, &mut visited).await
    }

    pub async fn start_chain(&self, name: &str) -> Result<()> {
        let chain = self
            .resolver
            .resolve_chain(name, self.instance)
            .with_context(|| format!("Failed to resolve chain '{}'", name))?;

        let mut visited = HashSet::new();
        for dep in &chain.service.service_deps {
            self.start_service_with(dep, &mut visited)
                .await
                .with_context(|| format!("Failed to start service '{}' for chain '{}'", dep, name))?;
        }

        info!("Starting chain {}", name);
        self.ensure_running(&chain.service, &chain.operations).await
    }

    fn start_service_with<'a>(
        &'a self,
        name: &'a str,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if !visited.insert(name.to_string()) {
                return Ok(());
            }

            let definition = self
                .resolver
                .resolve_service(name, self.instance)
                .with_context(|| format!("Failed to resolve service '{}'", name))?;

            for dep in &definition.service.service_deps {
                self.start_service_with(dep, visited)
                    .await
                    .with_context(|| format!("Failed to start dependency '{}' of '{}'", dep, name))?;
            }

            info!("Starting service {}", name);
            self.ensure_running(&definition.service, &definition.operations)
                .await
        })
    }

    async fn ensure_running(&self, spec: &ServiceSpec, ops: &ServiceOperations) -> Result<()> {
        let mut spec = spec.clone();
        if let Some(data_name) = ops.data_container_name.as_deref().filter(|_| ops.data_container) {
            self.ensure_data_container(data_name, &spec).await?;
            if !spec.volumes_from.iter().any(|v| v == data_name) {
                spec.volumes_from.push(data_name.to_string());
            }
        }

        let name = &ops.container_name;
        match self.runtime.inspect_container(name).await? {
            Some(state) if state.running => {
                debug!("Container {} is already running", name);
            }
            Some(_) => {
                debug!("Starting existing container {}", name);
                self.runtime.start_container(name).await?;
            }
            None => {
                self.ensure_image(&spec.image).await?;
                debug!("Creating container {} from {}", name, spec.image);
                self.runtime.create_container(name, &spec).await?;
                self.runtime.start_container(name).await?;
            }
        }
        Ok(())
    }

    /// Data containers are created but never started.
    async fn ensure_data_container(&self, name: &str, spec: &ServiceSpec) -> Result<()> {
        if self.runtime.inspect_container(name).await?.is_some() {
            return Ok(());
        }

        self.ensure_image(&spec.image).await?;
        let data_spec = ServiceSpec {
            name: name.to_string(),
            image: spec.image.clone(),
            volumes: spec.volumes.clone(),
            labels: spec.labels.clone(),
            ..Default::default()
        };
        info!("Creating data container {}", name);
        self.runtime.create_container(name, &data_spec).await?;
        Ok(())
    }

    async fn ensure_image(&self, image: &str) -> Result<()> {
        if !self.runtime.image_exists(image).await? {
            info!("Pulling image {}", image);
            self.runtime.pull_image(image).await?;
        }
        Ok(())
    }

    pub async fn stop_service(&self, name: &str) -> Result<()> {
        let definition = self.resolver.resolve_service(name, self.instance)?;
        self.stop(&definition.operations).await
    }

    pub async fn stop_chain(&self, name: &str) -> Result<()> {
        let chain = self.resolver.resolve_chain(name, self.instance)?;
        self.stop(&chain.operations).await
    }

    async fn stop(&self, ops: &ServiceOperations) -> Result<()> {
        match self.runtime.inspect_container(&ops.container_name).await? {
            Some(state) if state.running => {
                info!("Stopping container {}", ops.container_name);
                self.runtime
                    .stop_container(&ops.container_name, self.stop_timeout)
                    .await?;
            }
            _ => info!("Container {} is not running", ops.container_name),
        }
        Ok(())
    }

    pub async fn remove_service(&self, name: &str, remove_data: bool) -> Result<()> {
        let definition = self.resolver.resolve_service(name, self.instance)?;
        self.remove(&definition.operations, remove_data).await
    }

    pub async fn remove_chain(&self, name: &str, remove_data: bool) -> Result<()> {
        let chain = self.resolver.resolve_chain(name, self.instance)?;
        self.remove(&chain.operations, remove_data).await
    }

    async fn remove(&self, ops: &ServiceOperations, remove_data: bool) -> Result<()> {
        if self.runtime.inspect_container(&ops.container_name).await?.is_some() {
            info!("Removing container {}", ops.container_name);
            self.runtime
                .remove_container(&ops.container_name, remove_data)
                .await?;
        }

        if remove_data {
            if let Some(data_name) = &ops.data_container_name {
                if self.runtime.inspect_container(data_name).await?.is_some() {
                    info!("Removing data container {}", data_name);
                    self.runtime.remove_container(data_name, true).await?;
                }
            }
        }
        Ok(())
    }

    /// Rename a service's containers and move its definition file.
    ///
    /// `new` must differ from `old` and must not name an existing definition.
    pub async fn rename_service(&self, old: &str, new: &str) -> Result<()> {
        if old == new {
            anyhow::bail!("Service '{}' already has that name", old);
        }
        let known = self.store.list_known(DefinitionKind::Service)?;
        if !known.iter().any(|n| n == old) {
            anyhow::bail!("Unknown service '{}'", old);
        }
        if known.iter().any(|n| n == new) {
            anyhow::bail!("A service named '{}' already exists", new);
        }
        let old_path = self
            .store
            .definition_path(DefinitionKind::Service, old)
            .with_context(|| format!("No definition file for service '{}'", old))?;

        let mut definition = self.resolver.resolve_service(old, self.instance)?;
        let old_ops = std::mem::take(&mut definition.operations);
        let new_container = primary_container_name(ContainerKind::Service, new, self.instance);

        if self.runtime.inspect_container(&old_ops.container_name).await?.is_some() {
            info!("Renaming container {} to {}", old_ops.container_name, new_container);
            self.runtime
                .rename_container(&old_ops.container_name, &new_container)
                .await?;
        }

        if let (Some(old_data), Some(new_data)) = (
            old_ops.data_container_name.as_deref(),
            data_container_name(&new_container),
        ) {
            if self.runtime.inspect_container(old_data).await?.is_some() {
                info!("Renaming data container {} to {}", old_data, new_data);
                self.runtime.rename_container(old_data, &new_data).await?;
            }
        }

        definition.name = new.to_string();
        definition.service.name = new.to_string();
        let path = self.store.write_service(&definition)?;
        if path != old_path {
            self.store.remove_file(&old_path)?;
        }
        debug!("Service {} now defined at {}", new, path.display());
        Ok(())
    }

    /// Recreate a service's container from its current definition.
    ///
    /// The primary container is stopped and removed (its data container is
    /// kept), the image is pulled unless `skip_pull` is set, then the service
    /// is created and started again.
    pub async fn update_service(&self, name: &str, skip_pull: bool) -> Result<()> {
        let definition = self.resolver.resolve_service(name, self.instance)?;
        self.rebuild(&definition.service, &definition.operations, skip_pull)
            .await
    }

    pub async fn update_chain(&self, name: &str, skip_pull: bool) -> Result<()> {
        let chain = self.resolver.resolve_chain(name, self.instance)?;
        self.rebuild(&chain.service, &chain.operations, skip_pull).await
    }

    async fn rebuild(&self, spec: &ServiceSpec, ops: &ServiceOperations, skip_pull: bool) -> Result<()> {
        info!("Rebuilding container {}", ops.container_name);
        self.stop(ops).await?;
        self.remove(ops, false).await?;
        if !skip_pull {
            info!("Pulling image {}", spec.image);
            self.runtime.pull_image(&spec.image).await?;
        }
        self.ensure_running(spec, ops).await
    }

    pub async fn logs_service(&self, name: &str, tail: Option<usize>) -> Result<String> {
        let definition = self.resolver.resolve_service(name, self.instance)?;
        self.logs(&definition.operations, tail).await
    }

    pub async fn logs_chain(&self, name: &str, tail: Option<usize>) -> Result<String> {
        let chain = self.resolver.resolve_chain(name, self.instance)?;
        self.logs(&chain.operations, tail).await
    }

    async fn logs(&self, ops: &ServiceOperations, tail: Option<usize>) -> Result<String> {
        if self.runtime.inspect_container(&ops.container_name).await?.is_none() {
            anyhow::bail!("No container {}", ops.container_name);
        }
        Ok(self
            .runtime
            .container_logs(&ops.container_name, tail)
            .await?)
    }

    /// Run `cmd` inside the service's running container.
    pub async fn exec_service(&self, name: &str, cmd: &[String]) -> Result<ExecOutput> {
        let definition = self.resolver.resolve_service(name, self.instance)?;
        self.exec(&definition.operations, cmd).await
    }

    pub async fn exec_chain(&self, name: &str, cmd: &[String]) -> Result<ExecOutput> {
        let chain = self.resolver.resolve_chain(name, self.instance)?;
        self.exec(&chain.operations, cmd).await
    }

    async fn exec(&self, ops: &ServiceOperations, cmd: &[String]) -> Result<ExecOutput> {
        if cmd.is_empty() {
            anyhow::bail!("No command given");
        }
        match self.runtime.inspect_container(&ops.container_name).await? {
            Some(state) if state.running => {}
            _ => anyhow::bail!("Container {} is not running", ops.container_name),
        }
        debug!("Exec in {}: {:?}", ops.container_name, cmd);
        Ok(self
            .runtime
            .exec_in_container(&ops.container_name, cmd)
            .await?)
    }

    /// Resolved definition plus live container state as YAML, optionally
    /// narrowed to a dotted `field`.
    pub async fn inspect_service(&self, name: &str, field: Option<&str>) -> Result<String> {
        let definition = self.resolver.resolve_service(name, self.instance)?;
        self.render_inspection(&definition, &definition.operations, field)
            .await
    }

    pub async fn inspect_chain(&self, name: &str, field: Option<&str>) -> Result<String> {
        let chain = self.resolver.resolve_chain(name, self.instance)?;
        self.render_inspection(&chain, &chain.operations, field).await
    }

    async fn render_inspection<T: Serialize>(
        &self,
        definition: &T,
        ops: &ServiceOperations,
        field: Option<&str>,
    ) -> Result<String> {
        let state = self.runtime.inspect_container(&ops.container_name).await?;

        let mut tree = serde_yaml::to_value(definition)?;
        if let Value::Mapping(map) = &mut tree {
            map.insert(Value::from("container"), serde_yaml::to_value(&state)?);
        }

        let selected = match field {
            Some(path) => RawConfig::new(tree)
                .get(path)
                .cloned()
                .with_context(|| format!("No field '{}'", path))?,
            None => tree,
        };
        Ok(serde_yaml::to_string(&selected)?)
    }

    pub fn list_known(&self, kind: DefinitionKind) -> Result<Vec<String>> {
        Ok(self.store.list_known(kind)?)
    }

    /// `<name>_<n>` of every container of `kind`, running only unless `all`.
    pub async fn list_containers(&self, kind: ContainerKind, all: bool) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .runtime
            .list_container_names(all)
            .await?
            .iter()
            .filter_map(|raw| ParsedContainerName::parse(raw))
            .filter(|parsed| parsed.is_kind(kind))
            .map(|parsed| parsed.short_name())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub fn new_service(&self, name: &str, image: &str) -> Result<PathBuf> {
        let definition = ServiceDefinition::new(name, image);
        Ok(self.store.write_service(&definition)?)
    }
}

#[async_trait]
impl DependencyStarter for ContainerLifecycleService {
    async fn start_service(&self, name: &str) -> Result<()> {
        ContainerLifecycleService::start_service(self, name).await
    }

    async fn start_chain(&self, name: &str) -> Result<()> {
        ContainerLifecycleService::start_chain(self, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{ConfigError, ConfigReader};
    use crate::domain::runtime::{ContainerState, RuntimeError};
    use parking_lot::Mutex;
    use crate::domain::host_config::HostConfigSpec;
    use crate::infrastructure::definition_store::FileDefinitionStore;
    use std::collections::{BTreeMap, HashMap};
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<BTreeMap<(DefinitionKind, String), Value>>,
    }

    impl MemoryStore {
        fn with(self, kind: DefinitionKind, name: &str, yaml: &str) -> Self {
            self.files
                .lock()
                .insert((kind, name.to_string()), serde_yaml::from_str(yaml).unwrap());
            self
        }
    }

    impl ConfigReader for MemoryStore {
        fn read_config(&self, kind: DefinitionKind, name: &str) -> Result<RawConfig, ConfigError> {
            self.files
                .lock()
                .get(&(kind, name.to_string()))
                .cloned()
                .map(RawConfig::new)
                .ok_or_else(|| ConfigError::NotFound {
                    kind,
                    name: name.to_string(),
                })
        }
    }

    impl DefinitionStore for MemoryStore {
        fn list_known(&self, kind: DefinitionKind) -> Result<Vec<String>, ConfigError> {
            Ok(self
                .files
                .lock()
                .keys()
                .filter(|(k, _)| *k == kind)
                .map(|(_, n)| n.clone())
                .collect())
        }

        fn definition_path(&self, kind: DefinitionKind, name: &str) -> Option<PathBuf> {
            self.files
                .lock()
                .contains_key(&(kind, name.to_string()))
                .then(|| memory_path(kind, name))
        }

        fn write_service(&self, definition: &ServiceDefinition) -> Result<PathBuf, ConfigError> {
            let value = serde_yaml::to_value(definition).unwrap();
            self.files
                .lock()
                .insert((DefinitionKind::Service, definition.name.clone()), value);
            Ok(memory_path(DefinitionKind::Service, &definition.name))
        }

        fn remove_file(&self, path: &Path) -> Result<(), ConfigError> {
            self.files
                .lock()
                .retain(|(kind, name), _| memory_path(*kind, name) != path);
            Ok(())
        }
    }

    fn memory_path(kind: DefinitionKind, name: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}.yaml", kind, name))
    }

    #[derive(Default)]
    struct FakeRuntime {
        containers: Mutex<HashMap<String, (ServiceSpec, bool)>>,
        images: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRuntime {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn spec(&self, name: &str) -> ServiceSpec {
            self.containers.lock()[name].0.clone()
        }

        fn running(&self, name: &str) -> bool {
            self.containers.lock().get(name).is_some_and(|(_, r)| *r)
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn inspect_container(&self, name: &str) -> Result<Option<ContainerState>, RuntimeError> {
            Ok(self.containers.lock().get(name).map(|(spec, running)| ContainerState {
                name: name.to_string(),
                image: spec.image.clone(),
                status: if *running { "running" } else { "created" }.to_string(),
                running: *running,
            }))
        }

        async fn image_exists(&self, image: &str) -> Result<bool, RuntimeError> {
            Ok(self.images.lock().contains(image))
        }

        async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
            self.calls.lock().push(format!("pull {}", image));
            self.images.lock().insert(image.to_string());
            Ok(())
        }

        async fn create_container(&self, name: &str, spec: &ServiceSpec) -> Result<(), RuntimeError> {
            self.calls.lock().push(format!("create {}", name));
            self.containers
                .lock()
                .insert(name.to_string(), (spec.clone(), false));
            Ok(())
        }

        async fn start_container(&self, name: &str) -> Result<(), RuntimeError> {
            self.calls.lock().push(format!("start {}", name));
            match self.containers.lock().get_mut(name) {
                Some(entry) => {
                    entry.1 = true;
                    Ok(())
                }
                None => Err(RuntimeError::ContainerNotFound(name.to_string())),
            }
        }

        async fn stop_container(&self, name: &str, _timeout: Duration) -> Result<(), RuntimeError> {
            self.calls.lock().push(format!("stop {}", name));
            if let Some(entry) = self.containers.lock().get_mut(name) {
                entry.1 = false;
            }
            Ok(())
        }

        async fn remove_container(&self, name: &str, _remove_volumes: bool) -> Result<(), RuntimeError> {
            self.calls.lock().push(format!("remove {}", name));
            self.containers.lock().remove(name);
            Ok(())
        }

        async fn rename_container(&self, name: &str, new_name: &str) -> Result<(), RuntimeError> {
            self.calls.lock().push(format!("rename {} {}", name, new_name));
            let mut containers = self.containers.lock();
            let entry = containers
                .remove(name)
                .ok_or_else(|| RuntimeError::ContainerNotFound(name.to_string()))?;
            containers.insert(new_name.to_string(), entry);
            Ok(())
        }

        async fn list_container_names(&self, all: bool) -> Result<Vec<String>, RuntimeError> {
            Ok(self
                .containers
                .lock()
                .iter()
                .filter(|(_, (_, running))| all || *running)
                .map(|(name, _)| format!("/{}", name))
                .collect())
        }

        async fn container_logs(&self, name: &str, tail: Option<usize>) -> Result<String, RuntimeError> {
            self.calls.lock().push(format!("logs {} {:?}", name, tail));
            let lines = ["booting", "listening on 4001", "ready"];
            let skip = tail.map_or(0, |n| lines.len().saturating_sub(n));
            Ok(lines[skip..].iter().map(|l| format!("{}\n", l)).collect())
        }

        async fn exec_in_container(&self, name: &str, cmd: &[String]) -> Result<ExecOutput, RuntimeError> {
            self.calls.lock().push(format!("exec {} {}", name, cmd.join(" ")));
            Ok(ExecOutput {
                stdout: format!("{}\n", cmd.join(" ")),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::default()
            .with(
                DefinitionKind::Service,
                "keys",
                "service:\n  name: keys\n  image: eris/keys\n",
            )
            .with(
                DefinitionKind::Service,
                "ipfs",
                "service:\n  name: ipfs\n  image: eris/ipfs\n  data_container: true\n  volumes: [/data]\n",
            )
            .with(
                DefinitionKind::Service,
                "erisdb",
                "service:\n  name: erisdb\n  image: eris/erisdb\n  services: [keys]\n",
            )
            .with(DefinitionKind::Chain, "mychain", "type: erisdb\n")
    }

    fn service(runtime: &Arc<FakeRuntime>) -> ContainerLifecycleService {
        ContainerLifecycleService::new(Arc::new(store()), runtime.clone())
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.start_service("keys").await.unwrap();
        lifecycle.start_service("keys").await.unwrap();

        assert!(runtime.running("eris_service_keys_1"));
        assert_eq!(
            runtime.calls(),
            vec![
                "pull eris/keys",
                "create eris_service_keys_1",
                "start eris_service_keys_1",
            ]
        );
    }

    #[tokio::test]
    async fn test_start_stopped_container() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.start_service("keys").await.unwrap();
        lifecycle.stop_service("keys").await.unwrap();
        assert!(!runtime.running("eris_service_keys_1"));

        lifecycle.start_service("keys").await.unwrap();
        assert!(runtime.running("eris_service_keys_1"));
        assert_eq!(
            runtime.calls().last().map(String::as_str),
            Some("start eris_service_keys_1")
        );
    }

    #[tokio::test]
    async fn test_data_container_is_created_not_started() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.start_service("ipfs").await.unwrap();

        assert!(!runtime.running("eris_data_ipfs_1"));
        assert_eq!(runtime.spec("eris_data_ipfs_1").volumes, vec!["/data".to_string()]);
        assert!(runtime.running("eris_service_ipfs_1"));
        assert_eq!(
            runtime.spec("eris_service_ipfs_1").volumes_from,
            vec!["eris_data_ipfs_1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_chain_starts_template_dependencies_first() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.start_chain("mychain").await.unwrap();

        let starts: Vec<String> = runtime
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("start "))
            .collect();
        assert_eq!(
            starts,
            vec!["start eris_service_keys_1", "start eris_chain_mychain_1"]
        );
    }

    #[tokio::test]
    async fn test_start_unknown_service_fails() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        assert!(lifecycle.start_service("nosuch").await.is_err());
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_with_data() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.start_service("ipfs").await.unwrap();
        lifecycle.remove_service("ipfs", true).await.unwrap();

        assert!(runtime.containers.lock().is_empty());
    }

    #[tokio::test]
    async fn test_rename_moves_containers_and_definition() {
        let runtime = Arc::new(FakeRuntime::default());
        let store = Arc::new(store());
        let lifecycle = ContainerLifecycleService::new(store.clone(), runtime.clone());

        lifecycle.start_service("ipfs").await.unwrap();
        lifecycle.rename_service("ipfs", "files").await.unwrap();

        assert!(runtime.running("eris_service_files_1"));
        assert!(runtime.containers.lock().contains_key("eris_data_files_1"));
        let known = store.list_known(DefinitionKind::Service).unwrap();
        assert!(known.contains(&"files".to_string()));
        assert!(!known.contains(&"ipfs".to_string()));

        let renamed = lifecycle.resolver().resolve_service("files", 1).unwrap();
        assert!(renamed.operations.data_container);

        assert!(lifecycle.rename_service("ghost", "x").await.is_err());
    }

    fn file_store(root: &Path) -> Arc<FileDefinitionStore> {
        let spec = HostConfigSpec {
            eris_dir: root.to_path_buf(),
            ..Default::default()
        };
        let store = FileDefinitionStore::from_config(&spec);
        std::fs::create_dir_all(store.dir(DefinitionKind::Service)).unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_rename_to_same_name_keeps_definition() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(tmp.path());
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = ContainerLifecycleService::new(store.clone(), runtime.clone());
        lifecycle.new_service("keys", "eris/keys").unwrap();

        assert!(lifecycle.rename_service("keys", "keys").await.is_err());

        assert_eq!(
            store.list_known(DefinitionKind::Service).unwrap(),
            vec!["keys".to_string()]
        );
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rename_onto_existing_service_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(tmp.path());
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = ContainerLifecycleService::new(store.clone(), runtime.clone());
        lifecycle.new_service("keys", "eris/keys").unwrap();
        lifecycle.new_service("ipfs", "eris/ipfs").unwrap();

        assert!(lifecycle.rename_service("keys", "ipfs").await.is_err());

        let ipfs = lifecycle.resolver().resolve_service("ipfs", 1).unwrap();
        assert_eq!(ipfs.service.image, "eris/ipfs");
        assert_eq!(
            store.list_known(DefinitionKind::Service).unwrap(),
            vec!["ipfs".to_string(), "keys".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rename_removes_original_file_format() {
        let tmp = TempDir::new().unwrap();
        let store = file_store(tmp.path());
        let services = store.dir(DefinitionKind::Service).to_path_buf();
        std::fs::write(services.join("keys.toml"), "[service]\nimage = \"eris/keys\"\n").unwrap();
        let lifecycle =
            ContainerLifecycleService::new(store.clone(), Arc::new(FakeRuntime::default()));

        lifecycle.rename_service("keys", "signer").await.unwrap();

        assert!(!services.join("keys.toml").exists());
        assert!(services.join("signer.yaml").is_file());
        let renamed = lifecycle.resolver().resolve_service("signer", 1).unwrap();
        assert_eq!(renamed.service.image, "eris/keys");
    }

    #[tokio::test]
    async fn test_update_recreates_container_and_keeps_data() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);
        lifecycle.start_service("ipfs").await.unwrap();
        runtime.calls.lock().clear();

        lifecycle.update_service("ipfs", false).await.unwrap();

        assert_eq!(
            runtime.calls(),
            vec![
                "stop eris_service_ipfs_1",
                "remove eris_service_ipfs_1",
                "pull eris/ipfs",
                "create eris_service_ipfs_1",
                "start eris_service_ipfs_1",
            ]
        );
        assert!(runtime.running("eris_service_ipfs_1"));
        assert!(runtime.containers.lock().contains_key("eris_data_ipfs_1"));
    }

    #[tokio::test]
    async fn test_update_creates_missing_container_without_pull() {
        let runtime = Arc::new(FakeRuntime::default());
        runtime.images.lock().insert("eris/keys".to_string());
        let lifecycle = service(&runtime);

        lifecycle.update_service("keys", true).await.unwrap();

        assert_eq!(
            runtime.calls(),
            vec!["create eris_service_keys_1", "start eris_service_keys_1"]
        );
    }

    #[tokio::test]
    async fn test_logs_and_exec() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        assert!(lifecycle.logs_service("keys", None).await.is_err());
        let cmd = vec!["ls".to_string(), "-la".to_string(), "/root/".to_string()];
        assert!(lifecycle.exec_service("keys", &cmd).await.is_err());

        lifecycle.start_service("keys").await.unwrap();
        let logs = lifecycle.logs_service("keys", Some(1)).await.unwrap();
        assert_eq!(logs, "ready\n");
        let logs = lifecycle.logs_service("keys", None).await.unwrap();
        assert_eq!(logs.lines().count(), 3);

        let output = lifecycle.exec_service("keys", &cmd).await.unwrap();
        assert_eq!(output.stdout, "ls -la /root/\n");
        assert_eq!(output.exit_code, 0);
        assert!(lifecycle.exec_service("keys", &[]).await.is_err());

        lifecycle.start_chain("mychain").await.unwrap();
        lifecycle.exec_chain("mychain", &cmd).await.unwrap();
        assert_eq!(
            runtime.calls().last().map(String::as_str),
            Some("exec eris_chain_mychain_1 ls -la /root/")
        );
    }

    #[tokio::test]
    async fn test_list_containers_and_inspect() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.start_chain("mychain").await.unwrap();
        lifecycle.start_service("ipfs").await.unwrap();

        assert_eq!(
            lifecycle.list_containers(ContainerKind::Service, false).await.unwrap(),
            vec!["ipfs_1".to_string(), "keys_1".to_string()]
        );
        assert_eq!(
            lifecycle.list_containers(ContainerKind::Chain, true).await.unwrap(),
            vec!["mychain_1".to_string()]
        );

        let image = lifecycle
            .inspect_chain("mychain", Some("service.image"))
            .await
            .unwrap();
        assert_eq!(image.trim(), "eris/erisdb");

        let running = lifecycle
            .inspect_service("keys", Some("container.running"))
            .await
            .unwrap();
        assert_eq!(running.trim(), "true");

        assert!(lifecycle.inspect_service("keys", Some("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_new_service_is_resolvable() {
        let runtime = Arc::new(FakeRuntime::default());
        let lifecycle = service(&runtime);

        lifecycle.new_service("btcd", "eris/btcd").unwrap();
        let def = lifecycle.resolver().resolve_service("btcd", 1).unwrap();
        assert_eq!(def.operations.container_name, "eris_service_btcd_1");
        assert!(lifecycle
            .list_known(DefinitionKind::Service)
            .unwrap()
            .contains(&"btcd".to_string()));
    }
}
