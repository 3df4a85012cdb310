// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Definition Resolver Application Service
//!
//! Turns a service or chain name into a fully populated definition.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Load → marshal → reset operations → validate → derive names
//! - **Dependencies:** Domain (definitions, merge rules, naming), a `ConfigReader`
//!
//! Nothing is cached: every call re-reads the definition files, so edits made
//! between invocations are always picked up.

use crate::domain::config::{ConfigError, ConfigReader, DefinitionKind, RawConfig};
use crate::domain::definition::{
    ChainDefinition, ServiceDefinition, ServiceOperations, ServiceSpec, ValidationError,
};
use crate::domain::naming::{data_container_name, primary_container_name, ContainerKind};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

const DATA_CONTAINER_KEY: &str = "service.data_container";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to marshal {kind} definition '{name}': {error}")]
    Marshal {
        kind: DefinitionKind,
        name: String,
        error: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to resolve service type '{service}' for chain '{chain}': {source}")]
    Template {
        chain: String,
        service: String,
        #[source]
        source: Box<ResolveError>,
    },
}

pub struct DefinitionResolver {
    reader: Arc<dyn ConfigReader>,
}

impl DefinitionResolver {
    pub fn new(reader: Arc<dyn ConfigReader>) -> Self {
        Self { reader }
    }

    /// Resolve a service definition for container instance `number`.
    pub fn resolve_service(&self, name: &str, number: u32) -> Result<ServiceDefinition, ResolveError> {
        let raw = self.load(DefinitionKind::Service, name)?;
        let mut definition: ServiceDefinition = marshal(&raw, DefinitionKind::Service, name)?;
        definition.operations = ServiceOperations::default();

        if definition.service.image.is_empty() {
            return Err(ValidationError::MissingImage {
                kind: "service",
                name: name.to_string(),
            }
            .into());
        }
        if definition.service.name.is_empty() {
            definition.service.name = ServiceSpec::name_from_image(&definition.service.image);
        }
        if definition.name.is_empty() {
            definition.name = name.to_string();
        }

        definition.operations = operations(
            &raw,
            &mut definition.service,
            ContainerKind::Service,
            number,
        );
        debug!(
            "Resolved service {} => {}",
            name, definition.operations.container_name
        );
        Ok(definition)
    }

    /// Resolve a chain definition layered over the service named by its
    /// `type`.
    pub fn resolve_chain(&self, name: &str, number: u32) -> Result<ChainDefinition, ResolveError> {
        let raw = self.load(DefinitionKind::Chain, name)?;
        let mut chain: ChainDefinition = marshal(&raw, DefinitionKind::Chain, name)?;
        chain.operations = ServiceOperations::default();

        if chain.name.is_empty() {
            chain.name = name.to_string();
        }
        if chain.chain_type.is_empty() {
            return Err(ValidationError::MissingChainType(chain.name).into());
        }

        let template = self
            .resolve_service(&chain.chain_type, number)
            .map_err(|e| ResolveError::Template {
                chain: chain.name.clone(),
                service: chain.chain_type.clone(),
                source: Box::new(e),
            })?;

        let specific = std::mem::take(&mut chain.service);
        chain.service = specific.merge_template(template.service);
        chain.service.name = chain.name.clone();

        chain.operations = operations(&raw, &mut chain.service, ContainerKind::Chain, number);
        debug!(
            "Resolved chain {} (type {}) => {}",
            name, chain.chain_type, chain.operations.container_name
        );
        Ok(chain)
    }

    /// A missing file is not fatal here; it marshals to an empty definition
    /// and validation reports what is missing.
    fn load(&self, kind: DefinitionKind, name: &str) -> Result<RawConfig, ResolveError> {
        match self.reader.read_config(kind, name) {
            Ok(raw) => Ok(raw),
            Err(e) if e.is_not_found() => {
                warn!("{}", e);
                Ok(RawConfig::empty())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn marshal<T: DeserializeOwned + Default>(
    raw: &RawConfig,
    kind: DefinitionKind,
    name: &str,
) -> Result<T, ResolveError> {
    raw.marshal().map_err(|e| ResolveError::Marshal {
        kind,
        name: name.to_string(),
        error: e.to_string(),
    })
}

/// Derive container names from the entity's own name and its raw
/// `service.data_container` flag.
fn operations(
    raw: &RawConfig,
    service: &mut ServiceSpec,
    kind: ContainerKind,
    number: u32,
) -> ServiceOperations {
    let mut ops = ServiceOperations {
        container_name: primary_container_name(kind, &service.name, number),
        container_number: number,
        ..Default::default()
    };

    if raw.get_bool(DATA_CONTAINER_KEY) {
        service.auto_data = true;
        ops.data_container = true;
        ops.data_container_name = data_container_name(&ops.container_name);
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryReader {
        files: HashMap<(DefinitionKind, String), String>,
    }

    impl MemoryReader {
        fn with(mut self, kind: DefinitionKind, name: &str, yaml: &str) -> Self {
            self.files.insert((kind, name.to_string()), yaml.to_string());
            self
        }
    }

    impl ConfigReader for MemoryReader {
        fn read_config(&self, kind: DefinitionKind, name: &str) -> Result<RawConfig, ConfigError> {
            let yaml = self
                .files
                .get(&(kind, name.to_string()))
                .ok_or_else(|| ConfigError::NotFound {
                    kind,
                    name: name.to_string(),
                })?;
            serde_yaml::from_str(yaml)
                .map(RawConfig::new)
                .map_err(|e| ConfigError::Parse {
                    path: name.to_string(),
                    error: e.to_string(),
                })
        }
    }

    fn resolver(reader: MemoryReader) -> DefinitionResolver {
        DefinitionResolver::new(Arc::new(reader))
    }

    const IPFS: &str = r#"
name: ipfs
service:
  name: ipfs
  image: eris/ipfs
  data_container: true
  ports: ["4001:4001", "5001:5001"]
"#;

    const ERISDB: &str = r#"
name: erisdb
service:
  image: eris/erisdb
  command: erisdb-wrapper
  services: [keys]
  ports: ["46656:46656", "46657:46657"]
  labels:
    tier: node
    vendor: eris
  cpu_shares: 1024
"#;

    #[test]
    fn test_resolve_service_with_data_container() {
        let resolver = resolver(MemoryReader::default().with(DefinitionKind::Service, "ipfs", IPFS));
        let def = resolver.resolve_service("ipfs", 1).unwrap();

        assert_eq!(def.name, "ipfs");
        assert_eq!(def.service.name, "ipfs");
        assert!(def.service.auto_data);
        assert_eq!(def.operations.container_name, "eris_service_ipfs_1");
        assert!(def.operations.data_container);
        assert_eq!(
            def.operations.data_container_name.as_deref(),
            Some("eris_data_ipfs_1")
        );
    }

    #[test]
    fn test_service_name_falls_back_to_image() {
        let resolver = resolver(MemoryReader::default().with(
            DefinitionKind::Service,
            "keys",
            "service:\n  image: eris/keys\n",
        ));
        let def = resolver.resolve_service("keys", 2).unwrap();

        assert_eq!(def.name, "keys");
        assert_eq!(def.service.name, "eris_keys");
        assert_eq!(def.operations.container_name, "eris_service_eris_keys_2");
        assert!(!def.operations.data_container);
        assert!(def.operations.data_container_name.is_none());
    }

    #[test]
    fn test_missing_image_is_a_validation_error() {
        let resolver = resolver(MemoryReader::default().with(
            DefinitionKind::Service,
            "bare",
            "name: bare\nservice:\n  ports: [\"80\"]\n  data_container: true\n",
        ));
        let err = resolver.resolve_service("bare", 1).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Validation(ValidationError::MissingImage { .. })
        ));

        // an absent file marshals to an empty definition and fails the same way
        let err = resolver.resolve_service("absent", 1).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Validation(ValidationError::MissingImage { .. })
        ));
    }

    #[test]
    fn test_marshal_failure() {
        let resolver = resolver(MemoryReader::default().with(
            DefinitionKind::Service,
            "typo",
            "service:\n  image: eris/x\n  ports: 5\n",
        ));
        let err = resolver.resolve_service("typo", 1).unwrap_err();
        assert!(matches!(err, ResolveError::Marshal { .. }));
    }

    #[test]
    fn test_resolve_chain_merges_template() {
        let chain_yaml = r#"
name: mychain
type: erisdb
service:
  ports: ["1337:1337"]
  labels:
    tier: validator
  data_container: "true"
"#;
        let resolver = resolver(
            MemoryReader::default()
                .with(DefinitionKind::Service, "erisdb", ERISDB)
                .with(DefinitionKind::Chain, "mychain", chain_yaml),
        );
        let chain = resolver.resolve_chain("mychain", 1).unwrap();

        assert_eq!(chain.service.name, "mychain");
        assert_eq!(chain.service.image, "eris/erisdb");
        assert_eq!(chain.service.command, "erisdb-wrapper");
        assert_eq!(chain.service.ports, vec!["1337:1337".to_string()]);
        assert_eq!(chain.service.service_deps, vec!["keys".to_string()]);
        assert_eq!(chain.service.cpu_shares, 1024);
        assert_eq!(chain.service.labels["tier"], "validator");
        assert_eq!(chain.service.labels["vendor"], "eris");
        assert_eq!(chain.operations.container_name, "eris_chain_mychain_1");
        assert_eq!(
            chain.operations.data_container_name.as_deref(),
            Some("eris_data_mychain_1")
        );
    }

    #[test]
    fn test_chain_data_flag_comes_from_chain_not_template() {
        let template = "service:\n  image: eris/erisdb\n  data_container: true\n";
        let resolver = resolver(
            MemoryReader::default()
                .with(DefinitionKind::Service, "erisdb", template)
                .with(DefinitionKind::Chain, "plain", "type: erisdb\n"),
        );
        let chain = resolver.resolve_chain("plain", 1).unwrap();

        assert_eq!(chain.name, "plain");
        assert!(!chain.operations.data_container);
        assert!(!chain.service.auto_data);
    }

    #[test]
    fn test_chain_with_unknown_type() {
        let resolver = resolver(MemoryReader::default().with(
            DefinitionKind::Chain,
            "orphan",
            "type: nosuchservice\n",
        ));
        let err = resolver.resolve_chain("orphan", 1).unwrap_err();
        match err {
            ResolveError::Template { service, source, .. } => {
                assert_eq!(service, "nosuchservice");
                assert!(matches!(*source, ResolveError::Validation(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = resolver.resolve_chain("missing", 1).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Validation(ValidationError::MissingChainType(_))
        ));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let resolver = resolver(MemoryReader::default().with(DefinitionKind::Service, "ipfs", IPFS));
        let first = resolver.resolve_service("ipfs", 1).unwrap();
        let second = resolver.resolve_service("ipfs", 1).unwrap();
        assert_eq!(first, second);
    }
}
