//! Instance resolution errors.
//!
//! Every variant here is recoverable from the caller's point of view: the
//! agent can pick another instance or fix its configuration and retry.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Diagnostic, Debug)]
pub enum ResolveError {
    #[error("Instance '{name}' not found. Available: {available}")]
    #[diagnostic(
        code(vikunja_mcp::instances::not_found),
        help("Use list_instances to see configured names.")
    )]
    NotFound { name: String, available: String },

    #[error(
        "No instance configured. Set VIKUNJA_URL/VIKUNJA_TOKEN or configure instances."
    )]
    #[diagnostic(code(vikunja_mcp::instances::none_configured))]
    NoInstance,

    #[error("Environment variable {var} not set for instance '{instance}'")]
    #[diagnostic(code(vikunja_mcp::instances::missing_env))]
    MissingEnvVar { var: String, instance: String },

    #[error("Instance '{name}' missing url or token")]
    #[diagnostic(code(vikunja_mcp::instances::missing_credentials))]
    MissingCredentials { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl ResolveError {
    pub(crate) fn not_found<'a>(name: &str, available: impl Iterator<Item = &'a String>) -> Self {
        let available: Vec<&str> = available.map(String::as_str).collect();
        ResolveError::NotFound {
            name: name.to_string(),
            available: if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            },
        }
    }
}

/// Result type for instance resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;
