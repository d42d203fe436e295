use miette::Diagnostic;
use thiserror::Error;

use crate::instances::ResolveError;

#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Vikunja API error ({status}): {message}")]
    #[diagnostic(code(vikunja_mcp::client::api_error))]
    Http { status: u16, message: String },

    #[error("Failed to connect to Vikunja: {source}")]
    #[diagnostic(
        code(vikunja_mcp::client::connection_failed),
        help("Check the instance URL and that the server is reachable.")
    )]
    ConnectionFailed {
        #[source]
        source: reqwest::Error,
    },

    #[error("Request failed: {source}")]
    #[diagnostic(code(vikunja_mcp::client::transport))]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from Vikunja: {message}")]
    #[diagnostic(
        code(vikunja_mcp::client::invalid_response),
        help("The server returned data in an unexpected format. This might indicate a version mismatch.")
    )]
    InvalidResponse { message: String },

    #[error("Failed to encode request body: {0}")]
    #[diagnostic(code(vikunja_mcp::client::encode))]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// Configuration problems the caller can fix without a server round trip.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ApiError::Resolve(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ApiError::ConnectionFailed { source: e }
        } else {
            ApiError::Transport { source: e }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidResponse {
            message: e.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
