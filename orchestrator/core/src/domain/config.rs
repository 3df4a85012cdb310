// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Raw definition trees and the reader contract that produces them.

use crate::domain::definition::ServiceDefinition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which family of definition files a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Service,
    Chain,
    Action,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Service => "service",
            DefinitionKind::Chain => "chain",
            DefinitionKind::Action => "action",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {kind} definition named '{name}'")]
    NotFound { kind: DefinitionKind, name: String },

    #[error("Failed to read definition file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse definition file {path}: {error}")]
    Parse { path: String, error: String },

    #[error("Failed to write definition file {path}: {error}")]
    Write { path: String, error: String },
}

impl ConfigError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}

/// Reads a named definition into an untyped tree.
pub trait ConfigReader: Send + Sync {
    fn read_config(&self, kind: DefinitionKind, name: &str) -> Result<RawConfig, ConfigError>;
}

/// A readable definition source that can also enumerate and edit its files.
pub trait DefinitionStore: ConfigReader {
    /// Base names of every definition of a kind, sorted.
    fn list_known(&self, kind: DefinitionKind) -> Result<Vec<String>, ConfigError>;

    /// File that `read_config` would use for `name`, if one exists.
    fn definition_path(&self, kind: DefinitionKind, name: &str) -> Option<PathBuf>;

    fn write_service(&self, definition: &ServiceDefinition) -> Result<PathBuf, ConfigError>;

    /// Delete exactly the file at `path`.
    fn remove_file(&self, path: &Path) -> Result<(), ConfigError>;

    /// Missing definitions are not an error.
    fn remove_definition(&self, kind: DefinitionKind, name: &str) -> Result<(), ConfigError> {
        match self.definition_path(kind, name) {
            Some(path) => self.remove_file(&path),
            None => Ok(()),
        }
    }
}

/// Untyped key/value tree read from a definition file.
///
/// Only lives for the duration of one resolution; it is marshaled into a
/// typed definition and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig(Value);

impl RawConfig {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn empty() -> Self {
        Self(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Mapping(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Marshal into a typed definition. An empty tree yields `T::default()`.
    pub fn marshal<T: DeserializeOwned + Default>(&self) -> Result<T, serde_yaml::Error> {
        if self.is_empty() {
            return Ok(T::default());
        }
        serde_yaml::from_value(self.0.clone())
    }

    /// Look up a dotted path such as `service.data_container`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |node, key| node.as_mapping()?.get(key))
    }

    /// Boolean at a dotted path, tolerant of the string and integer spellings
    /// that TOML and hand-written YAML produce. Missing or unrecognised values
    /// read as `false`.
    pub fn get_bool(&self, path: &str) -> bool {
        match self.get(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().map(|i| i != 0).unwrap_or(false),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "t" | "1" | "yes" | "on"
            ),
            _ => false,
        }
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self::empty()
    }
}
