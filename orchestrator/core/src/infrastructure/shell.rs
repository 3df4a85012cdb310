// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::command::{CommandError, CommandOutput, CommandRunner};
use crate::domain::environment::EnvironmentSet;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;

/// Runs commands through `sh -c`, blocking the caller until they exit.
///
/// The child sees only the environment it is handed; nothing leaks in from
/// the orchestrator process unless the caller layered it in.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        env: &EnvironmentSet,
    ) -> Result<CommandOutput, CommandError> {
        let mut cmd = tokio::process::Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .env_clear()
            .envs(env.os_vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| CommandError::Launch {
            command: command.to_string(),
            error: e.to_string(),
        })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }
}
