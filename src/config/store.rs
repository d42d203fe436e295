//! YAML-backed config store with atomic writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ConfigError, ConfigResult};
use crate::serde_utils::null_as_default;

/// Credentials for one Vikunja instance as written in the config file.
///
/// `token` may be a literal API token or a `${ENV_VAR}` reference that is
/// resolved when the instance is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEntry {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    /// Hand-written fields this crate does not use, kept on rewrite.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl InstanceEntry {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            extra: IndexMap::new(),
        }
    }
}

/// Defaults applied to tool calls that do not name an instance or project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
}

/// Full contents of the config file.
///
/// Map fields use `IndexMap` so hand-written ordering survives a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: IndexMap<String, InstanceEntry>,
    #[serde(default)]
    pub current_instance: Option<String>,
    /// Exchange-queue project per instance.
    #[serde(default, deserialize_with = "null_as_default")]
    pub xq: IndexMap<String, i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mcp_context: SessionContext,
    /// Unknown top-level sections, written back unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Handle to the config file on disk.
///
/// The file is read in full on every `load` and replaced atomically on every
/// `save`. There is no locking; the last writer wins.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config file. A missing or empty file yields the default config.
    pub fn load(&self) -> ConfigResult<ConfigFile> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConfigFile::default());
            }
            Err(e) => return Err(ConfigError::io(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(ConfigFile::default());
        }

        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Malformed {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Write the config via a temp file in the same directory, then rename it
    /// over the target.
    pub fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;

        let yaml = serde_yaml::to_string(config).map_err(ConfigError::Serialize)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".config")
            .suffix(".yaml")
            .tempfile_in(dir)
            .map_err(|e| ConfigError::io(dir, e))?;
        temp.write_all(yaml.as_bytes())
            .map_err(|e| ConfigError::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ConfigError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| ConfigError::io(&self.path, e.error))?;

        debug!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// Load, apply `f`, save, and return the updated config.
    pub fn update<F>(&self, f: F) -> ConfigResult<ConfigFile>
    where
        F: FnOnce(&mut ConfigFile),
    {
        let mut config = self.load()?;
        f(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}
