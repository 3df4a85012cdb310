// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Definition File Store
//!
//! Reads service, chain and action definitions from one directory per kind.
//! A definition named `ipfs` is looked up as `ipfs.yaml`, `ipfs.yml`,
//! `ipfs.json`, then `ipfs.toml`; the first existing file wins.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external definition files → untyped `RawConfig`
//! - **Anti-Corruption:** TOML is converted into the same tree as YAML/JSON

use crate::domain::config::{ConfigError, ConfigReader, DefinitionKind, DefinitionStore, RawConfig};
use crate::domain::definition::ServiceDefinition;
use crate::domain::host_config::HostConfigSpec;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

pub struct FileDefinitionStore {
    services_dir: PathBuf,
    chains_dir: PathBuf,
    actions_dir: PathBuf,
}

impl FileDefinitionStore {
    pub fn new(
        services_dir: impl Into<PathBuf>,
        chains_dir: impl Into<PathBuf>,
        actions_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            services_dir: services_dir.into(),
            chains_dir: chains_dir.into(),
            actions_dir: actions_dir.into(),
        }
    }

    pub fn from_config(spec: &HostConfigSpec) -> Self {
        Self::new(
            spec.definitions_dir(DefinitionKind::Service),
            spec.definitions_dir(DefinitionKind::Chain),
            spec.definitions_dir(DefinitionKind::Action),
        )
    }

    pub fn dir(&self, kind: DefinitionKind) -> &Path {
        match kind {
            DefinitionKind::Service => &self.services_dir,
            DefinitionKind::Chain => &self.chains_dir,
            DefinitionKind::Action => &self.actions_dir,
        }
    }

    fn parse(path: &Path, content: &str) -> Result<RawConfig, ConfigError> {
        let parse_err = |error: String| ConfigError::Parse {
            path: path.display().to_string(),
            error,
        };

        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let value = if is_toml {
            let table: toml::Value = toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            serde_yaml::to_value(table).map_err(|e| parse_err(e.to_string()))?
        } else {
            // YAML is a superset of JSON, so one parser covers both
            serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?
        };
        Ok(RawConfig::new(value))
    }
}

impl ConfigReader for FileDefinitionStore {
    fn read_config(&self, kind: DefinitionKind, name: &str) -> Result<RawConfig, ConfigError> {
        let path = self
            .definition_path(kind, name)
            .ok_or_else(|| ConfigError::NotFound {
                kind,
                name: name.to_string(),
            })?;

        debug!("Reading {} definition from {}", kind, path.display());
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&path, &content)
    }
}

impl DefinitionStore for FileDefinitionStore {
    fn list_known(&self, kind: DefinitionKind) -> Result<Vec<String>, ConfigError> {
        let dir = self.dir(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir).map_err(|e| ConfigError::Io {
            path: dir.display().to_string(),
            error: e.to_string(),
        })?;

        let mut names = BTreeSet::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let known_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            if !known_ext || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn definition_path(&self, kind: DefinitionKind, name: &str) -> Option<PathBuf> {
        let dir = self.dir(kind);
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
    }

    /// Writes `<services_dir>/<name>.yaml`.
    fn write_service(&self, definition: &ServiceDefinition) -> Result<PathBuf, ConfigError> {
        let path = self.services_dir.join(format!("{}.yaml", definition.name));
        let write_err = |error: String| ConfigError::Write {
            path: path.display().to_string(),
            error,
        };

        fs::create_dir_all(&self.services_dir).map_err(|e| write_err(e.to_string()))?;
        let yaml = serde_yaml::to_string(definition).map_err(|e| write_err(e.to_string()))?;
        fs::write(&path, yaml).map_err(|e| write_err(e.to_string()))?;

        debug!("Wrote service definition {}", path.display());
        Ok(path)
    }

    fn remove_file(&self, path: &Path) -> Result<(), ConfigError> {
        fs::remove_file(path).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        debug!("Removed definition {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(root: &Path) -> FileDefinitionStore {
        FileDefinitionStore::new(
            root.join("services"),
            root.join("blockchains"),
            root.join("actions"),
        )
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_reads_each_format() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "services/a.yaml", "service:\n  image: eris/a\n");
        write(tmp.path(), "services/b.json", r#"{"service": {"image": "eris/b"}}"#);
        write(
            tmp.path(),
            "services/c.toml",
            "[service]\nimage = \"eris/c\"\ndata_container = true\n",
        );
        let store = store(tmp.path());

        for (name, image) in [("a", "eris/a"), ("b", "eris/b"), ("c", "eris/c")] {
            let raw = store.read_config(DefinitionKind::Service, name).unwrap();
            assert_eq!(raw.get("service.image").and_then(|v| v.as_str()), Some(image));
        }
        let raw = store.read_config(DefinitionKind::Service, "c").unwrap();
        assert!(raw.get_bool("service.data_container"));
    }

    #[test]
    fn test_missing_and_malformed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "blockchains/broken.yaml", "service: [unclosed\n");
        let store = store(tmp.path());

        let err = store.read_config(DefinitionKind::Service, "nope").unwrap_err();
        assert!(err.is_not_found());

        let err = store.read_config(DefinitionKind::Chain, "broken").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_list_known_is_sorted_and_deduplicated() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "services/ipfs.yaml", "");
        write(tmp.path(), "services/ipfs.toml", "");
        write(tmp.path(), "services/keys.json", "{}");
        write(tmp.path(), "services/README.md", "");
        let store = store(tmp.path());

        assert_eq!(
            store.list_known(DefinitionKind::Service).unwrap(),
            vec!["ipfs".to_string(), "keys".to_string()]
        );
        assert!(store.list_known(DefinitionKind::Action).unwrap().is_empty());
    }

    #[test]
    fn test_write_then_remove_service() {
        let tmp = TempDir::new().unwrap();
        let store = store(tmp.path());

        let path = store
            .write_service(&ServiceDefinition::new("keys", "eris/keys"))
            .unwrap();
        assert!(path.ends_with("services/keys.yaml"));

        let raw = store.read_config(DefinitionKind::Service, "keys").unwrap();
        assert_eq!(raw.get("service.image").and_then(|v| v.as_str()), Some("eris/keys"));

        store.remove_definition(DefinitionKind::Service, "keys").unwrap();
        assert!(store.definition_path(DefinitionKind::Service, "keys").is_none());
    }
}
