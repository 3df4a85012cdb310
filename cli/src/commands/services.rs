// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service commands
//!
//! Commands: start, stop, update, logs, exec, rm, rename, inspect, known, ls, new

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use eris_core::domain::config::{DefinitionKind, DefinitionStore};
use eris_core::domain::naming::ContainerKind;
use eris_core::domain::runtime::ExecOutput;

use crate::context::ErisContext;

#[derive(Subcommand)]
pub enum ServicesCommand {
    /// Start services (and the services they depend on)
    Start {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// Stop running services
    Stop {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,

        /// Remove the containers once stopped
        #[arg(long)]
        rm: bool,

        /// With --rm, also remove data containers and volumes
        #[arg(short = 'x', long, requires = "rm")]
        data: bool,
    },

    /// Recreate a service's container from its current definition
    Update {
        #[arg(value_name = "NAME")]
        name: String,

        /// Reuse the local image instead of pulling
        #[arg(long)]
        skip_pull: bool,
    },

    /// Show a service container's logs
    Logs {
        #[arg(value_name = "NAME")]
        name: String,

        /// Only the last N lines
        #[arg(short, long, value_name = "N")]
        tail: Option<usize>,
    },

    /// Run a command inside a running service container
    Exec {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Remove service containers
    #[command(name = "rm")]
    Remove {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,

        /// Also remove data containers and volumes
        #[arg(short = 'x', long)]
        data: bool,

        /// Also delete the definition file
        #[arg(short, long)]
        force: bool,
    },

    /// Rename a service's containers and definition
    Rename {
        #[arg(value_name = "OLD")]
        old: String,

        #[arg(value_name = "NEW")]
        new: String,
    },

    /// Show a resolved service definition and its container state
    Inspect {
        #[arg(value_name = "NAME")]
        name: String,

        /// Dotted field to show, e.g. service.image
        #[arg(value_name = "FIELD")]
        field: Option<String>,
    },

    /// List service definitions
    Known,

    /// List service containers
    #[command(name = "ls")]
    List {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,
    },

    /// Write a minimal service definition
    New {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "IMAGE")]
        image: String,
    },
}

pub async fn handle_command(command: ServicesCommand, config_path: Option<PathBuf>) -> Result<()> {
    let context = ErisContext::load(config_path)?;

    match command {
        ServicesCommand::Start { names } => {
            let lifecycle = context.lifecycle()?;
            for name in names {
                lifecycle
                    .start_service(&name)
                    .await
                    .with_context(|| format!("Failed to start service '{}'", name))?;
                println!("{}", format!("✓ Service {} running", name).green());
            }
        }
        ServicesCommand::Stop { names, rm, data } => {
            let lifecycle = context.lifecycle()?;
            for name in names {
                lifecycle
                    .stop_service(&name)
                    .await
                    .with_context(|| format!("Failed to stop service '{}'", name))?;
                if rm {
                    lifecycle
                        .remove_service(&name, data)
                        .await
                        .with_context(|| format!("Failed to remove service '{}'", name))?;
                }
                println!("{}", format!("✓ Service {} stopped", name).green());
            }
        }
        ServicesCommand::Update { name, skip_pull } => {
            context
                .lifecycle()?
                .update_service(&name, skip_pull)
                .await
                .with_context(|| format!("Failed to update service '{}'", name))?;
            println!("{}", format!("✓ Service {} updated", name).green());
        }
        ServicesCommand::Logs { name, tail } => {
            let logs = context.lifecycle()?.logs_service(&name, tail).await?;
            print!("{}", logs);
        }
        ServicesCommand::Exec { name, args } => {
            let output = context.lifecycle()?.exec_service(&name, &args).await?;
            print_exec(output)?;
        }
        ServicesCommand::Remove { names, data, force } => {
            let lifecycle = context.lifecycle()?;
            for name in names {
                lifecycle
                    .remove_service(&name, data)
                    .await
                    .with_context(|| format!("Failed to remove service '{}'", name))?;
                if force {
                    context
                        .store
                        .remove_definition(DefinitionKind::Service, &name)?;
                }
                println!("{}", format!("✓ Service {} removed", name).green());
            }
        }
        ServicesCommand::Rename { old, new } => {
            context.lifecycle()?.rename_service(&old, &new).await?;
            println!("{}", format!("✓ Service {} renamed to {}", old, new).green());
        }
        ServicesCommand::Inspect { name, field } => {
            let rendered = context
                .lifecycle()?
                .inspect_service(&name, field.as_deref())
                .await?;
            print!("{}", rendered);
        }
        ServicesCommand::Known => {
            print_names(
                context.store.list_known(DefinitionKind::Service)?,
                "service definitions",
            );
        }
        ServicesCommand::List { all } => {
            let names = context
                .lifecycle()?
                .list_containers(ContainerKind::Service, all)
                .await?;
            let label = if all { "service containers" } else { "running services" };
            print_names(names, label);
        }
        ServicesCommand::New { name, image } => {
            let path = context.lifecycle()?.new_service(&name, &image)?;
            println!(
                "{}",
                format!("✓ Service {} defined in {}", name, path.display()).green()
            );
        }
    }
    Ok(())
}

/// Relay captured exec output; a non-zero exit becomes an error.
pub(crate) fn print_exec(output: ExecOutput) -> Result<()> {
    print!("{}", output.stdout);
    eprint!("{}", output.stderr);
    if output.exit_code != 0 {
        anyhow::bail!("Command exited with status {}", output.exit_code);
    }
    Ok(())
}

pub(crate) fn print_names(names: Vec<String>, label: &str) {
    if names.is_empty() {
        println!("{}", format!("No {} found", label).yellow());
        return;
    }
    for name in names {
        println!("{}", name);
    }
}
