//! Config store error types.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while reading or writing the config file.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Malformed config file {path}: {source}")]
    #[diagnostic(
        code(vikunja_mcp::config::malformed),
        help("Fix the YAML by hand or delete the file to start over.")
    )]
    Malformed {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    #[diagnostic(code(vikunja_mcp::config::serialize))]
    Serialize(#[source] serde_yaml::Error),

    #[error("Config IO error on {path}: {source}")]
    #[diagnostic(code(vikunja_mcp::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for config store operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
