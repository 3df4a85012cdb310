// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod definition_store;
pub mod runtime;
pub mod shell;

pub use definition_store::FileDefinitionStore;
pub use runtime::DockerRuntime;
pub use shell::ShellCommandRunner;
