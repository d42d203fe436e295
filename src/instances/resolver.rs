//! Instance resolution.
//!
//! Instances come from three places, merged with earlier sources winning:
//!
//! 1. the `instances` section of the config file
//! 2. `VIKUNJA_INSTANCES`, either an array of `{name, url, token}` objects or
//!    an object keyed by name
//! 3. `VIKUNJA_URL` + `VIKUNJA_TOKEN`, registered as `default`

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use super::env::{Environment, INSTANCES_VAR, TOKEN_VAR, URL_VAR};
use super::error::{ResolveError, ResolveResult};
use crate::config::{ConfigFile, ConfigStore, InstanceEntry, SessionContext};

/// Name of the instance built from the flat environment variables.
pub const DEFAULT_INSTANCE: &str = "default";

/// Fully resolved credentials ready to authenticate a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub url: String,
    pub token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvInstances {
    List(Vec<NamedEntry>),
    Map(IndexMap<String, InstanceEntry>),
}

#[derive(Deserialize)]
struct NamedEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    token: String,
}

/// Resolves which instance a call should use and what its credentials are.
///
/// Every method re-reads the config file; nothing is cached between calls.
pub struct InstanceResolver<E> {
    store: ConfigStore,
    env: E,
}

impl<E: Environment> InstanceResolver<E> {
    pub fn new(store: ConfigStore, env: E) -> Self {
        Self { store, env }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// All known instances in precedence order.
    pub fn resolve_instances(&self) -> ResolveResult<IndexMap<String, InstanceEntry>> {
        let config = self.store.load()?;
        Ok(self.merge(&config))
    }

    fn merge(&self, config: &ConfigFile) -> IndexMap<String, InstanceEntry> {
        let mut instances = config.instances.clone();

        if let Some(raw) = self.env.var(INSTANCES_VAR).filter(|v| !v.trim().is_empty()) {
            match serde_json::from_str::<EnvInstances>(&raw) {
                Ok(EnvInstances::List(list)) => {
                    for item in list {
                        if item.name.is_empty() {
                            continue;
                        }
                        instances
                            .entry(item.name)
                            .or_insert_with(|| InstanceEntry::new(item.url, item.token));
                    }
                }
                Ok(EnvInstances::Map(map)) => {
                    for (name, entry) in map {
                        instances
                            .entry(name)
                            .or_insert_with(|| InstanceEntry::new(entry.url, entry.token));
                    }
                }
                Err(e) => warn!("Ignoring malformed {}: {}", INSTANCES_VAR, e),
            }
        }

        if !instances.contains_key(DEFAULT_INSTANCE) {
            let url = self.env.var(URL_VAR).filter(|v| !v.is_empty());
            let token = self.env.var(TOKEN_VAR).filter(|v| !v.is_empty());
            if let (Some(url), Some(token)) = (url, token) {
                instances.insert(
                    DEFAULT_INSTANCE.to_string(),
                    InstanceEntry::new(url, token),
                );
            }
        }

        instances
    }

    /// Name of the instance used when a call does not specify one.
    pub fn resolve_current(&self) -> ResolveResult<Option<String>> {
        let config = self.store.load()?;
        let instances = self.merge(&config);
        Ok(Self::pick_current(&config, &instances))
    }

    fn pick_current(
        config: &ConfigFile,
        instances: &IndexMap<String, InstanceEntry>,
    ) -> Option<String> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        non_empty(&config.mcp_context.instance)
            .or_else(|| non_empty(&config.current_instance))
            .or_else(|| {
                instances
                    .contains_key(DEFAULT_INSTANCE)
                    .then(|| DEFAULT_INSTANCE.to_string())
            })
            .or_else(|| instances.keys().next().cloned())
    }

    /// Persist `name` as the current instance and as the session context
    /// instance.
    pub fn set_current(&self, name: &str) -> ResolveResult<InstanceEntry> {
        let instances = self.resolve_instances()?;
        let entry = instances
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::not_found(name, instances.keys()))?;

        self.store.update(|config| {
            config.current_instance = Some(name.to_string());
            config.mcp_context.instance = Some(name.to_string());
        })?;
        debug!("Switched current instance to {}", name);
        Ok(entry)
    }

    /// Credentials for `name`, or for the current instance when `name` is
    /// `None` or empty.
    pub fn credentials(&self, name: Option<&str>) -> ResolveResult<Credentials> {
        let config = self.store.load()?;
        let instances = self.merge(&config);

        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => Self::pick_current(&config, &instances).ok_or(ResolveError::NoInstance)?,
        };

        let entry = instances
            .get(&name)
            .ok_or_else(|| ResolveError::not_found(&name, instances.keys()))?;

        if entry.url.is_empty() || entry.token.is_empty() {
            return Err(ResolveError::MissingCredentials { name });
        }

        let token = self.expand_token(&name, &entry.token)?;
        Ok(Credentials {
            url: entry.url.trim_end_matches('/').to_string(),
            token,
            name,
        })
    }

    /// Replace a `${NAME}` token with the value of env var `NAME`. Literal
    /// tokens are returned unchanged.
    pub fn expand_token(&self, instance: &str, token: &str) -> ResolveResult<String> {
        let Some(var) = token
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
        else {
            return Ok(token.to_string());
        };

        self.env
            .var(var)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ResolveError::MissingEnvVar {
                var: var.to_string(),
                instance: instance.to_string(),
            })
    }

    /// Current session context as stored in the config file.
    pub fn context(&self) -> ResolveResult<SessionContext> {
        Ok(self.store.load()?.mcp_context)
    }

    /// Update the session context.
    ///
    /// `instance`: `None` leaves it unchanged, an empty string clears it.
    /// `project_id`: `None` leaves it unchanged, `0` clears it.
    pub fn set_context(
        &self,
        instance: Option<&str>,
        project_id: Option<i64>,
    ) -> ResolveResult<SessionContext> {
        if let Some(name) = instance.filter(|n| !n.is_empty()) {
            let instances = self.resolve_instances()?;
            if !instances.contains_key(name) {
                return Err(ResolveError::not_found(name, instances.keys()));
            }
        }

        let config = self.store.update(|config| {
            match instance {
                Some("") => config.mcp_context.instance = None,
                Some(name) => config.mcp_context.instance = Some(name.to_string()),
                None => {}
            }
            match project_id {
                Some(0) => config.mcp_context.project_id = None,
                Some(id) => config.mcp_context.project_id = Some(id),
                None => {}
            }
        })?;
        Ok(config.mcp_context)
    }

    /// Store an instance in the config file, replacing any entry with the
    /// same name. The first instance stored also becomes the current one.
    pub fn add_instance(&self, name: &str, entry: InstanceEntry) -> ResolveResult<ConfigFile> {
        let config = self.store.update(|config| {
            config.instances.insert(name.to_string(), entry);
            if config.instances.len() == 1 {
                config.current_instance = Some(name.to_string());
            }
        })?;
        debug!("Stored instance {}", name);
        Ok(config)
    }

    /// Exchange-queue project per instance.
    pub fn xq_projects(&self) -> ResolveResult<IndexMap<String, i64>> {
        Ok(self.store.load()?.xq)
    }

    /// Record `project_id` as the exchange-queue project of `instance`.
    pub fn set_xq_project(&self, instance: &str, project_id: i64) -> ResolveResult<()> {
        self.store.update(|config| {
            config.xq.insert(instance.to_string(), project_id);
        })?;
        Ok(())
    }

    /// Exchange-queue project for `instance`, if one is configured.
    pub fn xq_project(&self, instance: &str) -> ResolveResult<Option<i64>> {
        Ok(self.store.load()?.xq.get(instance).copied())
    }
}
