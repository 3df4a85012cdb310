// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Action commands
//!
//! Commands: do, known

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use eris_core::domain::config::{DefinitionKind, DefinitionStore};

use crate::commands::services::print_names;
use crate::context::ErisContext;

#[derive(Subcommand)]
pub enum ActionsCommand {
    /// Perform an action
    ///
    /// Words name the action file (joined with `_`); `KEY:value` words set
    /// variables for its steps.
    Do {
        #[arg(value_name = "WORDS", required = true, num_args = 1.., trailing_var_arg = true)]
        tokens: Vec<String>,

        /// Chain to start instead of the one the action declares
        #[arg(long, value_name = "NAME")]
        chain: Option<String>,

        /// Do not print step output
        #[arg(short, long)]
        quiet: bool,

        /// Report format printed after the action completes
        #[arg(long, value_enum)]
        report: Option<ReportFormat>,
    },

    /// List action definitions
    Known,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    Json,
    Yaml,
}

pub async fn handle_command(command: ActionsCommand, config_path: Option<PathBuf>) -> Result<()> {
    let context = ErisContext::load(config_path)?;

    match command {
        ActionsCommand::Do {
            tokens,
            chain,
            quiet,
            report,
        } => {
            let runner = context.action_runner()?;
            let result = runner
                .perform(&context.action_resolver(), &tokens, chain.as_deref(), quiet)
                .await?;

            match report {
                Some(ReportFormat::Json) => println!("{}", serde_json::to_string_pretty(&result)?),
                Some(ReportFormat::Yaml) => print!("{}", serde_yaml::to_string(&result)?),
                None if !quiet => {
                    println!(
                        "{}",
                        format!("✓ Action {} performed", result.action).green()
                    );
                }
                None => {}
            }
        }
        ActionsCommand::Known => {
            print_names(
                context.store.list_known(DefinitionKind::Action)?,
                "action definitions",
            );
        }
    }
    Ok(())
}
