// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ordered environment with explicit override.
//!
//! Assigning a key that is already present drops the old entry and appends
//! the new one, so each key appears once and the most recent assignment is
//! last. Layering host environment, action variables and captured step output
//! is therefore an ordinary sequence of `set` calls.
//!
//! Host variables that are not valid unicode cannot be read or assigned by
//! actions; they are carried aside unchanged and handed to subprocesses
//! beneath every other entry.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};

/// Key holding the trimmed stdout of the previously completed step.
pub const PREVIOUS_OUTPUT_KEY: &str = "prev";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSet {
    entries: Vec<(String, String)>,
    #[serde(skip)]
    opaque: Vec<(OsString, OsString)>,
}

impl EnvironmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the orchestrator's own environment.
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    pub fn from_os_vars<I: IntoIterator<Item = (OsString, OsString)>>(vars: I) -> Self {
        let mut env = Self::new();
        for (key, value) in vars {
            match (key.to_str(), value.to_str()) {
                (Some(k), Some(v)) => env.set(k, v),
                _ => {
                    tracing::debug!("Passing through non-unicode environment variable {:?}", key);
                    env.opaque.retain(|(k, _)| *k != key);
                    env.opaque.push((key, value));
                }
            }
        }
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove(&key);
        self.opaque.retain(|(k, _)| k.as_os_str() != OsStr::new(&key));
        self.entries.push((key, value.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Apply every entry of `other` on top of `self`, in order.
    pub fn layer(&mut self, other: &EnvironmentSet) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Every entry as it should reach a subprocess: opaque host entries
    /// first, then the ordered entries.
    pub fn os_vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.opaque
            .iter()
            .map(|(k, v)| (k.as_os_str(), v.as_os_str()))
            .chain(self.entries.iter().map(|(k, v)| (OsStr::new(k), OsStr::new(v))))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `KEY=value` strings, for logging and for runtimes that want them.
    pub fn to_assignments(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (key, value) in iter {
            env.set(key, value);
        }
        env
    }
}
