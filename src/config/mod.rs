//! Local configuration state.
//!
//! Holds named instance credentials, the selected instance, the default
//! project context and the exchange-queue mapping. Everything else lives on
//! the Vikunja server.

mod error;
mod paths;
mod store;

#[cfg(test)]
mod paths_test;

pub use error::{ConfigError, ConfigResult};
pub use paths::{default_config_path, get_config_dir};
pub use store::{ConfigFile, ConfigStore, InstanceEntry, SessionContext};
