// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::definition::ServiceSpec;
use crate::domain::runtime::{ContainerRuntime, ContainerState, ExecOutput, RuntimeError};
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::errors::Error as DockerError;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{ContainerCreateBody, ExecConfig, HostConfig, PortBinding, PortMap};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, InspectContainerOptions,
    ListContainersOptionsBuilder, LogsOptionsBuilder, RemoveContainerOptionsBuilder,
    RenameContainerOptionsBuilder, StartContainerOptions, StopContainerOptionsBuilder,
};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn new(socket_path: Option<String>) -> Result<Self, RuntimeError> {
        // Connect to Docker daemon (custom socket or auto-detect)
        let docker = if let Some(path) = socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(&path, 120, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(&path, 120, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Failed to connect to Docker at {}: {}\n\n\
                 Ensure Docker is running and the socket path is correct.",
                path, e
            )))?
        } else {
            Docker::connect_with_local_defaults()
                .map_err(|e| RuntimeError::ConnectionFailed(format!(
                    "Failed to connect to Docker: {}\n\n\
                     Common causes:\n\
                     - Docker daemon not running (check: docker ps)\n\
                     - Permission denied accessing Docker socket\n\
                     - On Linux: Current user not in 'docker' group",
                    e
                )))?
        };

        Ok(Self { docker })
    }

    /// Verify Docker daemon is accessible
    pub async fn healthcheck(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await.map_err(|e| {
            RuntimeError::ConnectionFailed(format!(
                "Cannot connect to Docker daemon: {}\n\nVerify with: docker ps",
                e
            ))
        })?;
        Ok(())
    }
}

fn is_status(error: &DockerError, code: u16) -> bool {
    matches!(error, DockerError::DockerResponseServerError { status_code, .. } if *status_code == code)
}

/// `8080` and `8080/udp` stay as-is apart from a default `/tcp` suffix.
fn port_key(container_port: &str) -> String {
    if container_port.contains('/') {
        container_port.to_string()
    } else {
        format!("{}/tcp", container_port)
    }
}

/// Split `ports` entries (`container`, `host:container`, `ip:host:container`)
/// into exposed ports and host bindings.
fn port_bindings(ports: &[String]) -> (Vec<String>, PortMap) {
    let mut exposed = Vec::new();
    let mut bindings = PortMap::new();

    for port in ports {
        let parts: Vec<&str> = port.rsplitn(3, ':').collect();
        let (host_ip, host_port, container) = match parts.as_slice() {
            [container] => (None, None, *container),
            [container, host] => (None, Some(*host), *container),
            [container, host, ip] => (Some(*ip), Some(*host), *container),
            _ => continue,
        };
        let key = port_key(container);
        exposed.push(key.clone());
        if let Some(host_port) = host_port {
            let slot = bindings.entry(key).or_insert_with(|| Some(Vec::new()));
            slot.get_or_insert_with(Vec::new).push(PortBinding {
                host_ip: host_ip.map(str::to_string),
                host_port: Some(host_port.to_string()),
            });
        }
    }
    (exposed, bindings)
}

fn split_command(field: &str, value: &str) -> Result<Option<Vec<String>>, String> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    shell_words::split(value)
        .map(Some)
        .map_err(|e| format!("invalid {} `{}`: {}", field, value, e))
}

fn non_empty(list: &[String]) -> Option<Vec<String>> {
    (!list.is_empty()).then(|| list.to_vec())
}

fn non_blank(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Environment from the inline list followed by any `env_file` entries.
fn environment(spec: &ServiceSpec) -> Result<Vec<String>, String> {
    let mut env = spec.environment.clone();
    for file in &spec.env_file {
        let content = std::fs::read_to_string(file)
            .map_err(|e| format!("cannot read env_file {}: {}", file, e))?;
        env.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    Ok(env)
}

/// Map every `ServiceSpec` field onto Docker create options.
fn container_config(spec: &ServiceSpec) -> Result<ContainerCreateBody, String> {
    let (published, port_bindings) = port_bindings(&spec.ports);
    let mut exposed_ports: Vec<String> = Vec::new();
    for port in published.into_iter().chain(spec.expose.iter().map(|p| port_key(p))) {
        if !exposed_ports.contains(&port) {
            exposed_ports.push(port);
        }
    }

    let host_config = HostConfig {
        binds: non_empty(&spec.volumes),
        volumes_from: non_empty(&spec.volumes_from),
        links: non_empty(&spec.links),
        port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
        network_mode: non_blank(&spec.net),
        pid_mode: non_blank(&spec.pid),
        cap_add: non_empty(&spec.cap_add),
        cap_drop: non_empty(&spec.cap_drop),
        dns: non_empty(&spec.dns),
        dns_search: non_empty(&spec.dns_search),
        cpu_shares: (spec.cpu_shares != 0).then_some(spec.cpu_shares),
        memory: (spec.mem_limit != 0).then_some(spec.mem_limit),
        ..Default::default()
    };

    let labels: HashMap<String, String> = spec
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let env = environment(spec)?;

    Ok(ContainerCreateBody {
        image: Some(spec.image.clone()),
        cmd: split_command("command", &spec.command)?,
        entrypoint: split_command("entry_point", &spec.entry_point)?,
        env: non_empty(&env),
        labels: (!labels.is_empty()).then_some(labels),
        exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
        working_dir: non_blank(&spec.working_dir),
        hostname: non_blank(&spec.hostname),
        domainname: non_blank(&spec.domainname),
        user: non_blank(&spec.user),
        host_config: Some(host_config),
        ..Default::default()
    })
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerState>, RuntimeError> {
        let inspect = match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => inspect,
            Err(e) if is_status(&e, 404) => return Ok(None),
            Err(e) => return Err(RuntimeError::RequestFailed(e.to_string())),
        };

        let state = inspect.state.unwrap_or_default();
        Ok(Some(ContainerState {
            name: inspect
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_else(|| name.to_string()),
            image: inspect.config.and_then(|c| c.image).unwrap_or_default(),
            status: state
                .status
                .map(|s| format!("{:?}", s).to_lowercase())
                .unwrap_or_else(|| "unknown".to_string()),
            running: state.running.unwrap_or(false),
        }))
    }

    async fn image_exists(&self, image: &str) -> Result<bool, RuntimeError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(e) if is_status(&e, 404) => Ok(false),
            Err(e) => Err(RuntimeError::RequestFailed(e.to_string())),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        info!("Pulling image: {}", image);
        let options = CreateImageOptionsBuilder::new().from_image(image).build();

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            if let Err(e) = result {
                return Err(RuntimeError::PullFailed {
                    image: image.to_string(),
                    error: e.to_string(),
                });
            }
        }
        info!("Successfully pulled image: {}", image);
        Ok(())
    }

    async fn create_container(&self, name: &str, spec: &ServiceSpec) -> Result<(), RuntimeError> {
        let create_err = |error: String| RuntimeError::CreateFailed {
            name: name.to_string(),
            error,
        };
        let config = container_config(spec).map_err(create_err)?;
        let options = CreateContainerOptionsBuilder::new().name(name).build();

        self.docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| create_err(e.to_string()))?;
        debug!("Created container {} from {}", name, spec.image);
        Ok(())
    }

    async fn start_container(&self, name: &str) -> Result<(), RuntimeError> {
        match self
            .docker
            .start_container(name, None::<StartContainerOptions>)
            .await
        {
            // 304: already started
            Err(e) if !is_status(&e, 304) => Err(RuntimeError::StartFailed {
                name: name.to_string(),
                error: e.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn stop_container(&self, name: &str, timeout: Duration) -> Result<(), RuntimeError> {
        let seconds = i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX);
        let options = StopContainerOptionsBuilder::new().t(seconds).build();
        match self.docker.stop_container(name, Some(options)).await {
            Err(e) if !is_status(&e, 304) => Err(RuntimeError::StopFailed {
                name: name.to_string(),
                error: e.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn remove_container(&self, name: &str, remove_volumes: bool) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptionsBuilder::new()
            .force(true)
            .v(remove_volumes)
            .build();
        match self.docker.remove_container(name, Some(options)).await {
            Err(e) if is_status(&e, 404) => Err(RuntimeError::ContainerNotFound(name.to_string())),
            Err(e) => Err(RuntimeError::RemoveFailed {
                name: name.to_string(),
                error: e.to_string(),
            }),
            Ok(()) => Ok(()),
        }
    }

    async fn rename_container(&self, name: &str, new_name: &str) -> Result<(), RuntimeError> {
        let options = RenameContainerOptionsBuilder::new().name(new_name).build();
        self.docker
            .rename_container(name, options)
            .await
            .map_err(|e| RuntimeError::RenameFailed {
                name: name.to_string(),
                error: e.to_string(),
            })
    }

    async fn list_container_names(&self, all: bool) -> Result<Vec<String>, RuntimeError> {
        let options = ListContainersOptionsBuilder::new().all(all).build();
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| RuntimeError::RequestFailed(e.to_string()))?;

        Ok(containers
            .into_iter()
            .flat_map(|c| c.names.unwrap_or_default())
            .collect())
    }

    async fn container_logs(&self, name: &str, tail: Option<usize>) -> Result<String, RuntimeError> {
        let tail = tail.map_or_else(|| "all".to_string(), |n| n.to_string());
        let options = LogsOptionsBuilder::new()
            .stdout(true)
            .stderr(true)
            .tail(&tail)
            .build();

        let mut stream = self.docker.logs(name, Some(options));
        let mut logs = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(output) => logs.push_str(&output.to_string()),
                Err(e) if is_status(&e, 404) => {
                    return Err(RuntimeError::ContainerNotFound(name.to_string()))
                }
                Err(e) => return Err(RuntimeError::RequestFailed(e.to_string())),
            }
        }
        Ok(logs)
    }

    async fn exec_in_container(&self, name: &str, cmd: &[String]) -> Result<ExecOutput, RuntimeError> {
        let exec_err = |error: String| RuntimeError::ExecFailed {
            name: name.to_string(),
            error,
        };

        let config = ExecConfig {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(cmd.to_vec()),
            ..Default::default()
        };
        let exec = self
            .docker
            .create_exec(name, config)
            .await
            .map_err(|e| exec_err(e.to_string()))?;

        let start = StartExecOptions {
            detach: false,
            ..Default::default()
        };
        let results = self
            .docker
            .start_exec(&exec.id, Some(start))
            .await
            .map_err(|e| exec_err(e.to_string()))?;

        let mut captured = ExecOutput::default();
        if let StartExecResults::Attached { mut output, .. } = results {
            while let Some(message) = output.next().await {
                match message.map_err(|e| exec_err(e.to_string()))? {
                    LogOutput::StdOut { message } | LogOutput::Console { message } => {
                        captured.stdout.push_str(&String::from_utf8_lossy(&message))
                    }
                    LogOutput::StdErr { message } => {
                        captured.stderr.push_str(&String::from_utf8_lossy(&message))
                    }
                    LogOutput::StdIn { .. } => {}
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| exec_err(format!("failed to inspect exec: {}", e)))?;
        captured.exit_code = inspect.exit_code.unwrap_or(0);
        debug!("Exec in {} exited with {}", name, captured.exit_code);
        Ok(captured)
    }
}
