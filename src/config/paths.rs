//! Path resolution for the config file.

use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "VIKUNJA_MCP_CONFIG";

/// Get the config directory: `~/.vikunja-mcp/`.
///
/// Falls back to the current directory when HOME is not set.
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".vikunja-mcp")
}

/// Get the config file path.
///
/// Priority:
/// 1. `VIKUNJA_MCP_CONFIG` environment variable
/// 2. `~/.vikunja-mcp/config.yaml`
pub fn default_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| get_config_dir().join("config.yaml"))
}
