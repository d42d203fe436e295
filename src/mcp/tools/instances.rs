//! Instance and session-context tools

use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::*,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{ApiError, Project};
use crate::config::{InstanceEntry, SessionContext};
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, finish, non_empty};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SwitchInstanceParams {
    #[schemars(description = "Name of the instance to make current")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConnectInstanceParams {
    #[schemars(description = "Name to store the instance under")]
    pub name: String,
    #[schemars(description = "Base URL of the Vikunja server, e.g. https://tasks.example.com")]
    pub url: String,
    #[schemars(description = "API token. May be ${ENV_VAR} to read it from the environment")]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetActiveContextParams {
    #[schemars(description = "Instance to use by default (empty clears)")]
    pub instance: Option<String>,
    #[schemars(description = "Default project ID (0 clears)")]
    pub project_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListAllProjectsParams {
    #[schemars(description = "Only query this instance (default: all)")]
    pub instance: Option<String>,
}

fn context_json(context: &SessionContext, available: Vec<String>) -> serde_json::Value {
    json!({
        "instance": context.instance,
        "project_id": context.project_id,
        "available_instances": available,
    })
}

#[tool_router(router = instance_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "List configured Vikunja instances and show which one is current.")]
    pub async fn list_instances(&self) -> Result<CallToolResult, McpError> {
        let resolver = self.client.resolver();
        finish(async {
            let instances = resolver.resolve_instances()?;
            let current = resolver.resolve_current()?;
            let list: Vec<_> = instances
                .iter()
                .map(|(name, entry)| {
                    json!({
                        "name": name,
                        "url": entry.url,
                        "is_current": current.as_deref() == Some(name.as_str()),
                    })
                })
                .collect();
            Ok::<_, ToolError>(json!({ "instances": list, "current": current }))
        }
        .await)
    }

    #[tool(description = "Switch the current Vikunja instance. Persists across sessions.")]
    pub async fn switch_instance(
        &self,
        params: Parameters<SwitchInstanceParams>,
    ) -> Result<CallToolResult, McpError> {
        let name = params.0.name;
        finish(async {
            let entry = self.client.resolver().set_current(&name)?;
            info!("Switched to instance {}", name);
            Ok::<_, ToolError>(json!({ "switched_to": name, "url": entry.url }))
        }
        .await)
    }

    #[tool(
        description = "Connect a new Vikunja instance. The token is validated against the server before it is saved. The first instance connected becomes current."
    )]
    pub async fn connect_instance(
        &self,
        params: Parameters<ConnectInstanceParams>,
    ) -> Result<CallToolResult, McpError> {
        let ConnectInstanceParams { name, url, token } = params.0;
        finish(async {
            if name.trim().is_empty() || url.trim().is_empty() || token.trim().is_empty() {
                return Err(ToolError::recoverable("name, url and token are required"));
            }
            let url = url.trim_end_matches('/').to_string();
            // Validate with the expanded value but store the reference as given.
            let secret = self.client.resolver().expand_token(&name, &token)?;

            let user = match self.client.validate_token(&url, &secret).await {
                Ok(user) => user,
                Err(ApiError::Http { status, .. }) => {
                    return Err(ToolError::recoverable(format!(
                        "Token validation failed: {status}"
                    )));
                }
                Err(e) => {
                    return Err(ToolError::recoverable(format!("Connection failed: {e}")));
                }
            };

            let config = self
                .client
                .resolver()
                .add_instance(&name, InstanceEntry::new(url.clone(), token))?;
            info!("Connected instance {} as {}", name, user.username);

            Ok::<_, ToolError>(json!({
                "connected": name,
                "url": url,
                "user": user.username,
                "is_current": config.current_instance.as_deref() == Some(name.as_str()),
            }))
        }
        .await)
    }

    #[tool(description = "Show the current instance and its URL.")]
    pub async fn get_context(&self) -> Result<CallToolResult, McpError> {
        let resolver = self.client.resolver();
        finish(async {
            let current = resolver.resolve_current()?;
            let instances = resolver.resolve_instances()?;
            let url = current
                .as_deref()
                .and_then(|name| instances.get(name))
                .map(|entry| entry.url.clone())
                .unwrap_or_default();
            Ok::<_, ToolError>(json!({ "instance": current, "url": url }))
        }
        .await)
    }

    #[tool(
        description = "Set the default instance and project for this session. Tools use them when no instance or project_id is given."
    )]
    pub async fn set_active_context(
        &self,
        params: Parameters<SetActiveContextParams>,
    ) -> Result<CallToolResult, McpError> {
        let resolver = self.client.resolver();
        let instance = params.0.instance.unwrap_or_default();
        let project_id = params.0.project_id.unwrap_or(0);
        finish(async {
            let context = resolver.set_context(Some(&instance), Some(project_id))?;
            let available = resolver.resolve_instances()?.into_keys().collect();
            Ok::<_, ToolError>(context_json(&context, available))
        }
        .await)
    }

    #[tool(description = "Show the session's default instance and project.")]
    pub async fn get_active_context(&self) -> Result<CallToolResult, McpError> {
        let resolver = self.client.resolver();
        finish(async {
            let context = resolver.context()?;
            let available = resolver.resolve_instances()?.into_keys().collect();
            Ok::<_, ToolError>(context_json(&context, available))
        }
        .await)
    }

    #[tool(
        description = "List projects across all instances (or one). Unreachable instances are skipped."
    )]
    pub async fn list_all_projects(
        &self,
        params: Parameters<ListAllProjectsParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = non_empty(&params.0.instance);
        finish(async {
            let projects = self
                .client
                .for_each_instance::<Project>(reqwest::Method::GET, "/projects", filter)
                .await?;
            let rows: Vec<_> = projects
                .iter()
                .map(|p| {
                    json!({
                        "id": p.item.id,
                        "title": p.item.title,
                        "parent_project_id": p.item.parent_project_id,
                        "hex_color": p.item.hex_color,
                        "instance": p.instance,
                    })
                })
                .collect();
            Ok::<_, ToolError>(json!({ "count": rows.len(), "projects": rows }))
        }
        .await)
    }
}
