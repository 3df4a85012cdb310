// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # eris CLI
//!
//! The `eris` binary resolves service and chain definitions, manages their
//! containers, and performs actions against them.
//!
//! ## Commands
//!
//! - `eris services start|stop|update|logs|exec|rm|rename|inspect|known|ls|new` - Service containers
//! - `eris chains start|stop|update|logs|exec|rm|inspect|known|ls` - Chain containers
//! - `eris actions do|known` - Run action steps after starting their dependencies
//! - `eris config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use eris_cli::commands::{self, ActionsCommand, ChainsCommand, ConfigCommand, ServicesCommand};

/// eris - services, chains and actions on Docker
#[derive(Parser)]
#[command(name = "eris")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ERIS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ERIS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage service containers
    #[command(name = "services")]
    Services {
        #[command(subcommand)]
        command: ServicesCommand,
    },

    /// Manage chain containers
    #[command(name = "chains")]
    Chains {
        #[command(subcommand)]
        command: ChainsCommand,
    },

    /// Perform actions
    #[command(name = "actions")]
    Actions {
        #[command(subcommand)]
        command: ActionsCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Services { command }) => {
            commands::services::handle_command(command, cli.config).await
        }
        Some(Commands::Chains { command }) => {
            commands::chains::handle_command(command, cli.config).await
        }
        Some(Commands::Actions { command }) => {
            commands::actions::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    // Logs go to stderr so step output on stdout can be piped
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
