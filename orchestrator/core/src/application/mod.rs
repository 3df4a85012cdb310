// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod action_resolver;
pub mod action_runner;
pub mod definition_resolver;
pub mod lifecycle;

// Re-export services for convenience
pub use action_resolver::ActionResolver;
pub use action_runner::{ActionError, ActionRunner, DependencyStartError, StepExecutionError};
pub use definition_resolver::{DefinitionResolver, ResolveError};
pub use lifecycle::ContainerLifecycleService;
