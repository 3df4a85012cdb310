// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Action Definitions
//!
//! An action is an ordered list of shell steps run after its service and
//! chain dependencies are up.
//!
//! ```yaml
//! name: deploy contracts
//! services: [keys, ipfs]
//! chain: mychain
//! environment:
//!   CONTRACTS_DIR: ./contracts
//! steps:
//!   - eris-pm --chain $chain deploy $CONTRACTS_DIR
//!   - echo "deployed at $prev"
//! ```

use crate::domain::environment::EnvironmentSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    pub name: String,
    pub steps: Vec<String>,
    pub environment: BTreeMap<String, String>,
    #[serde(rename = "services")]
    pub service_deps: Vec<String>,
    pub chain: String,
}

/// Command-line tokens of an `actions do` invocation, split into the action
/// name and `KEY:value` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInvocation {
    pub name_tokens: Vec<String>,
    pub variables: Vec<(String, String)>,
}

impl ActionInvocation {
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invocation = Self::default();
        for token in tokens {
            let token = token.as_ref();
            match token.split_once(':') {
                Some((key, value)) if !key.is_empty() => {
                    invocation
                        .variables
                        .push((key.to_string(), value.to_string()));
                }
                _ => invocation.name_tokens.push(token.to_string()),
            }
        }
        invocation
    }

    /// File name of the action: name tokens joined with `_`.
    pub fn action_name(&self) -> String {
        self.name_tokens.join("_")
    }
}

/// An action plus the variables to apply while running it: CLI variables
/// first, then the declared environment, later entries overriding earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub spec: ActionSpec,
    pub variables: EnvironmentSet,
}

impl ResolvedAction {
    /// Chain the action depends on, if any.
    pub fn chain(&self) -> Option<&str> {
        let chain = self.spec.chain.trim();
        (!chain.is_empty()).then_some(chain)
    }
}

/// Progress of a single action execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPhase {
    Resolved,
    DependenciesStarting,
    DependenciesReady,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionPhase::Resolved => "resolved",
            ActionPhase::DependenciesStarting => "dependencies starting",
            ActionPhase::DependenciesReady => "dependencies ready",
            ActionPhase::Running => "running",
            ActionPhase::Completed => "completed",
            ActionPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutput {
    /// 1-based position in the action.
    pub index: usize,
    pub command: String,
    /// Trimmed stdout.
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: String,
    pub phase: ActionPhase,
    pub steps: Vec<StepOutput>,
}

impl ActionReport {
    pub fn last_output(&self) -> Option<&str> {
        self.steps.last().map(|s| s.output.as_str())
    }
}
