// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Chain commands
//!
//! Commands: start, stop, update, logs, exec, rm, inspect, known, ls

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use eris_core::domain::config::{DefinitionKind, DefinitionStore};
use eris_core::domain::naming::ContainerKind;

use crate::commands::services::{print_exec, print_names};
use crate::context::ErisContext;

#[derive(Subcommand)]
pub enum ChainsCommand {
    /// Start a chain and the services its type depends on
    Start {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Stop a running chain
    Stop {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Recreate a chain's container from its current definition
    Update {
        #[arg(value_name = "NAME")]
        name: String,

        /// Reuse the local image instead of pulling
        #[arg(long)]
        skip_pull: bool,
    },

    /// Show a chain container's logs
    Logs {
        #[arg(value_name = "NAME")]
        name: String,

        /// Only the last N lines
        #[arg(short, long, value_name = "N")]
        tail: Option<usize>,
    },

    /// Run a command inside a running chain container
    Exec {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Remove a chain's container
    #[command(name = "rm")]
    Remove {
        #[arg(value_name = "NAME")]
        name: String,

        /// Also remove the data container and volumes
        #[arg(short = 'x', long)]
        data: bool,
    },

    /// Show a resolved chain definition and its container state
    Inspect {
        #[arg(value_name = "NAME")]
        name: String,

        /// Dotted field to show, e.g. service.ports
        #[arg(value_name = "FIELD")]
        field: Option<String>,
    },

    /// List chain definitions
    Known,

    /// List chain containers
    #[command(name = "ls")]
    List {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,
    },
}

pub async fn handle_command(command: ChainsCommand, config_path: Option<PathBuf>) -> Result<()> {
    let context = ErisContext::load(config_path)?;

    match command {
        ChainsCommand::Start { name } => {
            context
                .lifecycle()?
                .start_chain(&name)
                .await
                .with_context(|| format!("Failed to start chain '{}'", name))?;
            println!("{}", format!("✓ Chain {} running", name).green());
        }
        ChainsCommand::Stop { name } => {
            context
                .lifecycle()?
                .stop_chain(&name)
                .await
                .with_context(|| format!("Failed to stop chain '{}'", name))?;
            println!("{}", format!("✓ Chain {} stopped", name).green());
        }
        ChainsCommand::Update { name, skip_pull } => {
            context
                .lifecycle()?
                .update_chain(&name, skip_pull)
                .await
                .with_context(|| format!("Failed to update chain '{}'", name))?;
            println!("{}", format!("✓ Chain {} updated", name).green());
        }
        ChainsCommand::Logs { name, tail } => {
            let logs = context.lifecycle()?.logs_chain(&name, tail).await?;
            print!("{}", logs);
        }
        ChainsCommand::Exec { name, args } => {
            let output = context.lifecycle()?.exec_chain(&name, &args).await?;
            print_exec(output)?;
        }
        ChainsCommand::Remove { name, data } => {
            context
                .lifecycle()?
                .remove_chain(&name, data)
                .await
                .with_context(|| format!("Failed to remove chain '{}'", name))?;
            println!("{}", format!("✓ Chain {} removed", name).green());
        }
        ChainsCommand::Inspect { name, field } => {
            let rendered = context
                .lifecycle()?
                .inspect_chain(&name, field.as_deref())
                .await?;
            print!("{}", rendered);
        }
        ChainsCommand::Known => {
            print_names(
                context.store.list_known(DefinitionKind::Chain)?,
                "chain definitions",
            );
        }
        ChainsCommand::List { all } => {
            let names = context
                .lifecycle()?
                .list_containers(ContainerKind::Chain, all)
                .await?;
            let label = if all { "chain containers" } else { "running chains" };
            print_names(names, label);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: ChainsCommand,
    }

    #[test]
    fn test_chain_verbs_parse() {
        let parsed = Harness::try_parse_from(["eris", "update", "mychain"]).unwrap();
        assert!(matches!(
            parsed.command,
            ChainsCommand::Update { skip_pull: false, .. }
        ));

        let parsed = Harness::try_parse_from(["eris", "exec", "mychain", "erisdb", "--version"]).unwrap();
        match parsed.command {
            ChainsCommand::Exec { name, args } => {
                assert_eq!(name, "mychain");
                assert_eq!(args, vec!["erisdb", "--version"]);
            }
            _ => panic!("expected exec"),
        }

        let parsed = Harness::try_parse_from(["eris", "rm", "-x", "mychain"]).unwrap();
        assert!(matches!(parsed.command, ChainsCommand::Remove { data: true, .. }));
    }
}
