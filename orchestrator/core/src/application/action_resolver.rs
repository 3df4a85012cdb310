// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Action Resolver Application Service
//!
//! Loads an action definition from the invocation tokens and builds its
//! variable list: CLI variables first, then the declared environment.

use crate::application::definition_resolver::ResolveError;
use crate::domain::action::{ActionInvocation, ActionSpec, ResolvedAction};
use crate::domain::config::{ConfigReader, DefinitionKind};
use crate::domain::definition::ValidationError;
use crate::domain::environment::EnvironmentSet;
use std::sync::Arc;
use tracing::debug;

pub struct ActionResolver {
    reader: Arc<dyn ConfigReader>,
}

impl ActionResolver {
    pub fn new(reader: Arc<dyn ConfigReader>) -> Self {
        Self { reader }
    }

    pub fn resolve<I, S>(&self, tokens: I) -> Result<ResolvedAction, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolve_invocation(&ActionInvocation::parse(tokens))
    }

    pub fn resolve_invocation(
        &self,
        invocation: &ActionInvocation,
    ) -> Result<ResolvedAction, ResolveError> {
        let name = invocation.action_name();
        if name.is_empty() {
            return Err(ValidationError::EmptyActionName.into());
        }

        let raw = self.reader.read_config(DefinitionKind::Action, &name)?;
        let mut spec: ActionSpec = raw.marshal().map_err(|e| ResolveError::Marshal {
            kind: DefinitionKind::Action,
            name: name.clone(),
            error: e.to_string(),
        })?;
        if spec.name.is_empty() {
            spec.name = name;
        }

        let mut variables = EnvironmentSet::new();
        for (key, value) in &invocation.variables {
            debug!("Setting CLI variable {}={}", key, value);
            variables.set(key, value);
        }
        for (key, value) in &spec.environment {
            debug!("Setting action variable {}={}", key, value);
            variables.set(key, value);
        }

        Ok(ResolvedAction { spec, variables })
    }
}
