//! Project tools

use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::*,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::client::Project;
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, finish, non_empty};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProjectIdParams {
    #[schemars(description = "Project ID")]
    pub project_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    #[schemars(description = "Project title")]
    pub title: String,
    #[schemars(description = "Project description")]
    pub description: Option<String>,
    #[schemars(description = "Hex colour, with or without leading #")]
    pub hex_color: Option<String>,
    #[schemars(description = "Parent project ID for nesting (0 or omitted: top level)")]
    pub parent_project_id: Option<i64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateProjectParams {
    #[schemars(description = "Project ID")]
    pub project_id: i64,
    #[schemars(description = "New title (empty keeps)")]
    pub title: Option<String>,
    #[schemars(description = "New description (empty keeps)")]
    pub description: Option<String>,
    #[schemars(description = "New hex colour (empty keeps)")]
    pub hex_color: Option<String>,
    #[schemars(description = "New parent project ID (-1 keeps, 0 moves to top level)")]
    pub parent_project_id: Option<i64>,
    #[schemars(description = "New position (-1 keeps)")]
    pub position: Option<f64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

fn project_row(p: &Project) -> Value {
    json!({
        "id": p.id,
        "title": p.title,
        "description": p.description,
        "parent_project_id": p.parent_project_id,
        "hex_color": p.hex_color,
        "is_favorite": p.is_favorite,
        "position": p.position,
    })
}

#[tool_router(router = project_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "List all projects on an instance.")]
    pub async fn list_projects(
        &self,
        params: Parameters<ListProjectsParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        finish(async {
            let projects: Vec<Project> = self.client.get("/projects", instance).await?;
            let rows: Vec<Value> = projects.iter().map(project_row).collect();
            Ok::<_, ToolError>(json!({ "projects": rows }))
        }
        .await)
    }

    #[tool(description = "Get a project by ID.")]
    pub async fn get_project(
        &self,
        params: Parameters<ProjectIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.project_id;
        finish(async {
            let p: Project = self.client.get(&format!("/projects/{id}"), instance).await?;
            Ok::<_, ToolError>(json!({
                "id": p.id,
                "title": p.title,
                "description": p.description,
                "hex_color": p.hex_color,
                "parent_project_id": p.parent_project_id,
            }))
        }
        .await)
    }

    #[tool(description = "Create a project, optionally nested under a parent project.")]
    pub async fn create_project(
        &self,
        params: Parameters<CreateProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let mut body = Map::new();
            body.insert("title".into(), json!(p.title));
            if let Some(description) = non_empty(&p.description) {
                body.insert("description".into(), json!(description));
            }
            if let Some(color) = non_empty(&p.hex_color) {
                body.insert("hex_color".into(), json!(color.trim_start_matches('#')));
            }
            if let Some(parent) = p.parent_project_id.filter(|id| *id > 0) {
                body.insert("parent_project_id".into(), json!(parent));
            }

            let created: Project = self.client.put("/projects", instance, &body).await?;
            info!("Created project {} ({})", created.title, created.id);
            Ok::<_, ToolError>(json!({
                "id": created.id,
                "title": created.title,
                "message": format!("Created project '{}'", created.title),
            }))
        }
        .await)
    }

    #[tool(
        description = "Update a project. Empty strings keep the current value; parent_project_id -1 keeps, 0 moves to top level; position -1 keeps."
    )]
    pub async fn update_project(
        &self,
        params: Parameters<UpdateProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        let id = p.project_id;
        finish(async {
            let path = format!("/projects/{id}");
            // Vikunja replaces the whole record, so start from the stored title.
            let current: Project = self.client.get(&path, instance).await?;

            let mut body = Map::new();
            let title = non_empty(&p.title).unwrap_or(current.title.as_str());
            body.insert("title".into(), json!(title));
            if let Some(description) = non_empty(&p.description) {
                body.insert("description".into(), json!(description));
            }
            if let Some(color) = non_empty(&p.hex_color) {
                body.insert("hex_color".into(), json!(color.trim_start_matches('#')));
            }
            if let Some(parent) = p.parent_project_id.filter(|id| *id >= 0) {
                body.insert("parent_project_id".into(), json!(parent));
            }
            if let Some(position) = p.position.filter(|pos| *pos >= 0.0) {
                body.insert("position".into(), json!(position));
            }

            let updated: Project = self.client.post(&path, instance, &body).await?;
            Ok::<_, ToolError>(json!({
                "id": updated.id,
                "title": updated.title,
                "updated": true,
            }))
        }
        .await)
    }

    #[tool(description = "Delete a project and all of its tasks.")]
    pub async fn delete_project(
        &self,
        params: Parameters<ProjectIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.project_id;
        finish(async {
            self.client
                .delete(&format!("/projects/{id}"), instance)
                .await?;
            info!("Deleted project {}", id);
            Ok::<_, ToolError>(json!({ "deleted": id }))
        }
        .await)
    }
}
