//! MCP transports
//!
//! The server speaks MCP either over stdio (the default for agent hosts that
//! spawn the binary) or over Streamable HTTP nested into an Axum router.

use rmcp::{
    ServiceExt,
    transport::{
        stdio,
        streamable_http_server::{
            StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
        },
    },
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::instances::Environment;

use super::server::VikunjaMcpServer;

/// Create the Streamable HTTP service.
///
/// Each session gets its own clone of `server`; clones share the client and
/// its instance resolver.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use axum::Router;
/// use tokio_util::sync::CancellationToken;
/// use vikunja_mcp::client::VikunjaClient;
/// use vikunja_mcp::config::ConfigStore;
/// use vikunja_mcp::instances::{InstanceResolver, ProcessEnv};
/// use vikunja_mcp::mcp::{VikunjaMcpServer, create_mcp_service};
///
/// let resolver = InstanceResolver::new(ConfigStore::new("config.yaml"), ProcessEnv);
/// let server = VikunjaMcpServer::new(VikunjaClient::new(Arc::new(resolver)));
/// let app: Router = Router::new()
///     .nest_service("/mcp", create_mcp_service(server, CancellationToken::new()));
/// ```
pub fn create_mcp_service<E: Environment + Send + Sync + 'static>(
    server: VikunjaMcpServer<E>,
    cancellation_token: CancellationToken,
) -> StreamableHttpService<VikunjaMcpServer<E>, LocalSessionManager> {
    let service_factory = move || -> Result<VikunjaMcpServer<E>, std::io::Error> {
        Ok(server.clone())
    };

    let config = StreamableHttpServerConfig::default()
        .with_sse_keep_alive(None)
        .with_sse_retry(None)
        .with_stateful_mode(true)
        .with_cancellation_token(cancellation_token);

    StreamableHttpService::new(
        service_factory,
        LocalSessionManager::default().into(),
        config,
    )
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn serve_stdio<E: Environment + Send + Sync + 'static>(
    server: VikunjaMcpServer<E>,
) -> std::io::Result<()> {
    info!("Serving MCP over stdio");
    let running = server.serve(stdio()).await.map_err(std::io::Error::other)?;
    running.waiting().await.map_err(std::io::Error::other)?;
    Ok(())
}
