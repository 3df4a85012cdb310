// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for eris CLI

pub mod actions;
pub mod chains;
pub mod config;
pub mod services;

pub use self::actions::ActionsCommand;
pub use self::chains::ChainsCommand;
pub use self::config::ConfigCommand;
pub use self::services::ServicesCommand;
