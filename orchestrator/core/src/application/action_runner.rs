// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Action Runner Application Service
//!
//! Executes a resolved action:
//!
//! ```text
//! Resolved → DependenciesStarting → DependenciesReady → Running → Completed
//!                     │                                    │
//!                     └──────────────► Failed ◄────────────┘
//! ```
//!
//! Dependencies start one at a time, services in declaration order and then
//! the chain. Steps run one at a time in a single environment layered as
//! host process, then action variables, then `prev`, the trimmed stdout of
//! the last completed step. The first failure ends the run; nothing already
//! done is undone.

use crate::application::action_resolver::ActionResolver;
use crate::application::definition_resolver::ResolveError;
use crate::domain::action::{ActionPhase, ActionReport, ResolvedAction, StepOutput};
use crate::domain::command::{CommandError, CommandRunner};
use crate::domain::environment::{EnvironmentSet, PREVIOUS_OUTPUT_KEY};
use crate::domain::naming::ContainerKind;
use crate::domain::runtime::DependencyStarter;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    DependencyStart(#[from] DependencyStartError),

    #[error(transparent)]
    StepExecution(#[from] StepExecutionError),
}

#[derive(Debug, Error)]
#[error("Failed to start {kind} '{dependency}': {source:#}")]
pub struct DependencyStartError {
    pub dependency: String,
    pub kind: ContainerKind,
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
#[error("Step {step} `{command}` failed: {reason}")]
pub struct StepExecutionError {
    /// 1-based.
    pub step: usize,
    pub command: String,
    /// Captured stdout, possibly partial.
    pub output: String,
    pub reason: StepFailure,
}

#[derive(Debug, Error)]
pub enum StepFailure {
    #[error(transparent)]
    Launch(#[from] CommandError),

    #[error("exit status {code}: {stderr}")]
    ExitStatus { code: i32, stderr: String },

    #[error("terminated by signal: {stderr}")]
    Signaled { stderr: String },
}

pub struct ActionRunner {
    starter: Arc<dyn DependencyStarter>,
    commands: Arc<dyn CommandRunner>,
    working_dir: Option<PathBuf>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl ActionRunner {
    pub fn new(starter: Arc<dyn DependencyStarter>, commands: Arc<dyn CommandRunner>) -> Self {
        Self {
            starter,
            commands,
            working_dir: None,
            output: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Write step output to `writer` instead of stdout.
    pub fn with_output(mut self, writer: impl Write + Send + 'static) -> Self {
        self.output = Mutex::new(Box::new(writer));
        self
    }

    /// Run steps in `dir` instead of the process's current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Resolve the action named by `tokens` and run it. A `chain` here
    /// replaces the one the action declares.
    pub async fn perform<I, S>(
        &self,
        resolver: &ActionResolver,
        tokens: I,
        chain: Option<&str>,
        quiet: bool,
    ) -> Result<ActionReport, ActionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut action = resolver.resolve(tokens)?;
        if let Some(chain) = chain {
            action.spec.chain = chain.to_string();
        }
        self.run(&action, quiet).await
    }

    pub async fn run(
        &self,
        action: &ResolvedAction,
        quiet: bool,
    ) -> Result<ActionReport, ActionError> {
        let mut report = ActionReport {
            action: action.spec.name.clone(),
            phase: ActionPhase::Resolved,
            steps: Vec::with_capacity(action.spec.steps.len()),
        };
        info!("Performing action {}", report.action);

        advance(&mut report, ActionPhase::DependenciesStarting);
        if let Err(e) = self.start_dependencies(action).await {
            advance(&mut report, ActionPhase::Failed);
            error!("{}", e);
            return Err(e.into());
        }
        advance(&mut report, ActionPhase::DependenciesReady);

        let working_dir = self
            .working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut env = EnvironmentSet::from_process();
        env.layer(&action.variables);

        advance(&mut report, ActionPhase::Running);
        for (i, command) in action.spec.steps.iter().enumerate() {
            let step = i + 1;
            info!("Running step {}: {}", step, command);

            match self.run_step(step, command, &working_dir, &env).await {
                Ok(output) => {
                    if !quiet {
                        self.emit(&output);
                    }
                    debug!("Setting {}={}", PREVIOUS_OUTPUT_KEY, output);
                    env.set(PREVIOUS_OUTPUT_KEY, output.clone());
                    report.steps.push(StepOutput {
                        index: step,
                        command: command.clone(),
                        output,
                    });
                }
                Err(e) => {
                    advance(&mut report, ActionPhase::Failed);
                    error!("{}", e);
                    return Err(e.into());
                }
            }
        }

        advance(&mut report, ActionPhase::Completed);
        info!("Action performed: {}", report.action);
        Ok(report)
    }

    async fn start_dependencies(&self, action: &ResolvedAction) -> Result<(), DependencyStartError> {
        for service in &action.spec.service_deps {
            info!("Starting service dependency {}", service);
            self.starter
                .start_service(service)
                .await
                .map_err(|source| DependencyStartError {
                    dependency: service.clone(),
                    kind: ContainerKind::Service,
                    source,
                })?;
        }

        if let Some(chain) = action.chain() {
            info!("Starting chain dependency {}", chain);
            self.starter
                .start_chain(chain)
                .await
                .map_err(|source| DependencyStartError {
                    dependency: chain.to_string(),
                    kind: ContainerKind::Chain,
                    source,
                })?;
        }
        Ok(())
    }

    /// Trimmed stdout of a successful step.
    async fn run_step(
        &self,
        step: usize,
        command: &str,
        working_dir: &Path,
        env: &EnvironmentSet,
    ) -> Result<String, StepExecutionError> {
        let fail = |output: String, reason: StepFailure| StepExecutionError {
            step,
            command: command.to_string(),
            output,
            reason,
        };

        let output = self
            .commands
            .run(command, working_dir, env)
            .await
            .map_err(|e| fail(String::new(), e.into()))?;

        let stdout = output.stdout.trim().to_string();
        match output.exit_code {
            Some(0) => Ok(stdout),
            Some(code) => Err(fail(
                stdout,
                StepFailure::ExitStatus {
                    code,
                    stderr: output.stderr.trim().to_string(),
                },
            )),
            None => Err(fail(
                stdout,
                StepFailure::Signaled {
                    stderr: output.stderr.trim().to_string(),
                },
            )),
        }
    }
}

impl ActionRunner {
    /// One line per step, empty output included.
    fn emit(&self, output: &str) {
        let mut writer = self.output.lock();
        if let Err(e) = writeln!(writer, "{}", output).and_then(|_| writer.flush()) {
            warn!("Failed to write step output: {}", e);
        }
    }
}

fn advance(report: &mut ActionReport, phase: ActionPhase) {
    debug!("Action {}: {} -> {}", report.action, report.phase, phase);
    report.phase = phase;
}
