// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service and Chain Definitions
//!
//! Typed shapes of the service and chain definition files, plus the derived
//! operational block that is recomputed on every resolution.
//!
//! # Definition Format
//!
//! ```yaml
//! name: ipfs
//! service:
//!   image: eris/ipfs
//!   data_container: true
//!   ports: ["4001:4001", "5001:5001"]
//!   environment: ["IPFS_PATH=/data"]
//! maintainer:
//!   name: Eris Industries
//!   email: support@erisindustries.com
//! ```
//!
//! A chain adds `type`, naming the service definition it is built on:
//!
//! ```yaml
//! name: mychain
//! type: erisdb
//! service:
//!   ports: ["46656:46656"]
//! ```

use crate::domain::merge::{merge_map, overwrite_int, overwrite_list, overwrite_string};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Semantic attributes of a container workload. Every field is "absent"
/// (empty or zero) when the definition file does not set it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    pub name: String,
    pub image: String,
    pub command: String,
    #[serde(rename = "services")]
    pub service_deps: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub links: Vec<String>,
    pub ports: Vec<String>,
    pub expose: Vec<String>,
    pub volumes: Vec<String>,
    pub volumes_from: Vec<String>,
    pub environment: Vec<String>,
    pub env_file: Vec<String>,
    pub net: String,
    pub pid: String,
    pub cap_add: Vec<String>,
    pub cap_drop: Vec<String>,
    pub dns: Vec<String>,
    pub dns_search: Vec<String>,
    pub cpu_shares: i64,
    pub working_dir: String,
    pub entry_point: String,
    pub hostname: String,
    pub domainname: String,
    pub user: String,
    pub mem_limit: i64,
    /// Set from `service.data_container` in the raw tree, never marshaled
    /// directly since hand-written booleans come in many spellings.
    #[serde(skip_deserializing, rename = "data_container")]
    pub auto_data: bool,
}

impl ServiceSpec {
    /// Layer `self` (the specific entity) over a template.
    ///
    /// `name` and `auto_data` are left untouched; they always come from the
    /// specific entity.
    pub fn merge_template(self, template: ServiceSpec) -> ServiceSpec {
        ServiceSpec {
            name: self.name,
            image: overwrite_string(self.image, template.image),
            command: overwrite_string(self.command, template.command),
            service_deps: overwrite_list(self.service_deps, template.service_deps),
            labels: merge_map(self.labels, template.labels),
            links: overwrite_list(self.links, template.links),
            ports: overwrite_list(self.ports, template.ports),
            expose: overwrite_list(self.expose, template.expose),
            volumes: overwrite_list(self.volumes, template.volumes),
            volumes_from: overwrite_list(self.volumes_from, template.volumes_from),
            environment: overwrite_list(self.environment, template.environment),
            env_file: overwrite_list(self.env_file, template.env_file),
            net: overwrite_string(self.net, template.net),
            pid: overwrite_string(self.pid, template.pid),
            cap_add: overwrite_list(self.cap_add, template.cap_add),
            cap_drop: overwrite_list(self.cap_drop, template.cap_drop),
            dns: overwrite_list(self.dns, template.dns),
            dns_search: overwrite_list(self.dns_search, template.dns_search),
            cpu_shares: overwrite_int(self.cpu_shares, template.cpu_shares),
            working_dir: overwrite_string(self.working_dir, template.working_dir),
            entry_point: overwrite_string(self.entry_point, template.entry_point),
            hostname: overwrite_string(self.hostname, template.hostname),
            domainname: overwrite_string(self.domainname, template.domainname),
            user: overwrite_string(self.user, template.user),
            mem_limit: overwrite_int(self.mem_limit, template.mem_limit),
            auto_data: self.auto_data,
        }
    }

    /// Name derived from the image when a definition leaves `name` empty:
    /// `eris/ipfs` becomes `eris_ipfs`.
    pub fn name_from_image(image: &str) -> String {
        image.replace('/', "_")
    }
}

/// Derived, never user-authored. Reset and recomputed on every resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceOperations {
    pub container_name: String,
    pub container_number: u32,
    pub data_container: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_container_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDefinition {
    pub name: String,
    pub service: ServiceSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<Maintainer>,
    #[serde(skip_deserializing, skip_serializing_if = "is_unset")]
    pub operations: ServiceOperations,
}

impl ServiceDefinition {
    /// Minimal definition as written by `services new`.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            service: ServiceSpec {
                name: name.clone(),
                image: image.into(),
                ..Default::default()
            },
            name,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainDefinition {
    pub name: String,
    /// Name of the service definition used as the template.
    #[serde(rename = "type")]
    pub chain_type: String,
    pub service: ServiceSpec,
    #[serde(skip_deserializing, skip_serializing_if = "is_unset")]
    pub operations: ServiceOperations,
}

fn is_unset(operations: &ServiceOperations) -> bool {
    operations == &ServiceOperations::default()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("An \"image\" field is required in the definition of {kind} '{name}'")]
    MissingImage { kind: &'static str, name: String },

    #[error("Chain '{0}' does not declare a service \"type\"")]
    MissingChainType(String),

    #[error("No action name given")]
    EmptyActionName,
}
