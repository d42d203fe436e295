use std::net::SocketAddr;

use axum::Router;
use clap::ValueEnum;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cli::error::{CliError, CliResult};
use crate::instances::Environment;
use crate::mcp::{VikunjaMcpServer, create_mcp_service, serve_stdio};

/// How the MCP server talks to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Transport {
    /// JSON-RPC over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP at /mcp
    Http,
}

/// Router serving the MCP endpoint at `/mcp`.
pub fn mcp_router<E: Environment + Send + Sync + 'static>(
    server: VikunjaMcpServer<E>,
    cancellation_token: CancellationToken,
) -> Router {
    Router::new()
        .nest_service("/mcp", create_mcp_service(server, cancellation_token))
        .layer(TraceLayer::new_for_http())
}

/// Run the MCP server on the chosen transport until the client goes away
/// or, for HTTP, until Ctrl-C.
pub async fn serve<E: Environment + Send + Sync + 'static>(
    server: VikunjaMcpServer<E>,
    transport: Transport,
    addr: SocketAddr,
) -> CliResult<()> {
    match transport {
        Transport::Stdio => Ok(serve_stdio(server).await?),
        Transport::Http => serve_http(server, addr).await,
    }
}

async fn serve_http<E: Environment + Send + Sync + 'static>(
    server: VikunjaMcpServer<E>,
    addr: SocketAddr,
) -> CliResult<()> {
    let cancellation_token = CancellationToken::new();
    let app = mcp_router(server, cancellation_token.clone());

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::BindFailed {
            addr: addr.to_string(),
            source,
        })?;
    info!("MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            cancellation_token.cancel();
        })
        .await?;

    Ok(())
}
