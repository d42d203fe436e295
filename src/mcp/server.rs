//! MCP server implementation
//!
//! One server struct carries every tool. The tool modules under
//! [`tools`](super::tools) each contribute a named router; `new` merges them.

use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{ServerCapabilities, ServerInfo},
    tool_handler,
};

use crate::client::VikunjaClient;
use crate::instances::Environment;

const INSTRUCTIONS: &str = "Manage tasks, projects, labels, and kanban boards in Vikunja.

Multi-instance support: use list_instances to see configured instances,
switch_instance to change, or pass instance to individual tools.

Quick tools for common queries:
- focus_now: tasks needing immediate attention
- due_today: today's tasks plus overdue
- task_summary: counts only, very fast

X-Q (exchange queue) for agent handoffs:
- check_xq: see pending handoff items
- claim_xq_task / complete_xq_task: process handoffs";

/// MCP server exposing Vikunja as tools.
///
/// Generic over the environment so tests can resolve instances without
/// touching process state.
pub struct VikunjaMcpServer<E> {
    pub(crate) client: VikunjaClient<E>,
    tool_router: ToolRouter<Self>,
}

impl<E> Clone for VikunjaMcpServer<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            tool_router: self.tool_router.clone(),
        }
    }
}

impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    pub fn new(client: VikunjaClient<E>) -> Self {
        Self {
            client,
            tool_router: Self::instance_router()
                + Self::project_router()
                + Self::task_router()
                + Self::label_router()
                + Self::kanban_router()
                + Self::relation_router()
                + Self::batch_router()
                + Self::transfer_router()
                + Self::query_router()
                + Self::xq_router(),
        }
    }

    pub fn client(&self) -> &VikunjaClient<E> {
        &self.client
    }

    /// Names of every registered tool.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }
}

#[tool_handler(router = self.tool_router)]
impl<E: Environment + Send + Sync + 'static> ServerHandler for VikunjaMcpServer<E> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_instructions(INSTRUCTIONS.to_string())
    }
}
