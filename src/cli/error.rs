use miette::Diagnostic;
use thiserror::Error;

use crate::client::ApiError;
use crate::config::ConfigError;
use crate::instances::ResolveError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to bind {addr}: {source}")]
    #[diagnostic(
        code(vikunja_mcp::cli::bind_failed),
        help("Is another process listening on this port? Try a different --port.")
    )]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP server error: {0}")]
    #[diagnostic(code(vikunja_mcp::cli::server))]
    Server(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(vikunja_mcp::cli::output))]
    Output(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
