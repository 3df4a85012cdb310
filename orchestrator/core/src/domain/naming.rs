// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Container Naming Convention
//!
//! Container names are the only identifiers shared with the container runtime,
//! so the format below is effectively a wire contract:
//!
//! ```text
//! eris_service_<name>_<n>     primary container of a service
//! eris_chain_<name>_<n>       primary container of a chain
//! eris_data_<name>_<n>        companion data container (segment 1 replaced)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub const CONTAINER_PREFIX: &str = "eris";
pub const DATA_SEGMENT: &str = "data";

static CONTAINER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A/?eris_(service|chain|data)_(.+)_(\d+)\z").expect("container name pattern is valid")
});

/// Kind of entity owning a primary container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Service,
    Chain,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Service => "service",
            ContainerKind::Chain => "chain",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `eris_<kind>_<name>_<n>`
pub fn primary_container_name(kind: ContainerKind, name: &str, number: u32) -> String {
    format!("{}_{}_{}_{}", CONTAINER_PREFIX, kind.as_str(), name, number)
}

/// Companion data container for a primary container name.
///
/// Replaces the second underscore-delimited segment with `data`. Returns
/// `None` when the name has fewer than two segments, which never happens for
/// names built by [`primary_container_name`].
pub fn data_container_name(primary: &str) -> Option<String> {
    let mut segments: Vec<&str> = primary.split('_').collect();
    if segments.len() < 2 {
        return None;
    }
    segments[1] = DATA_SEGMENT;
    Some(segments.join("_"))
}

/// A runtime container name parsed back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContainerName {
    pub segment: String,
    pub name: String,
    pub number: u32,
}

impl ParsedContainerName {
    /// Parse a name as reported by the runtime (optionally `/`-prefixed).
    ///
    /// Link aliases such as `/eris_service_a_1/b` are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = CONTAINER_NAME_RE.captures(raw)?;
        let name = caps.get(2)?.as_str();
        if name.contains('/') {
            return None;
        }
        Some(Self {
            segment: caps.get(1)?.as_str().to_string(),
            name: name.to_string(),
            number: caps.get(3)?.as_str().parse().ok()?,
        })
    }

    pub fn is_kind(&self, kind: ContainerKind) -> bool {
        self.segment == kind.as_str()
    }

    /// `<name>_<n>`, as listed to users.
    pub fn short_name(&self) -> String {
        format!("{}_{}", self.name, self.number)
    }
}
