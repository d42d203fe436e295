//! Kanban views and buckets

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

use crate::client::{Bucket, BucketAssignment, ProjectView, VikunjaClient};
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, ToolResult, finish, kanban_view, match_bucket, non_empty};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProjectViewsParams {
    #[schemars(description = "Project ID")]
    pub project_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListBucketsParams {
    #[schemars(description = "Project ID")]
    pub project_id: i64,
    #[schemars(description = "Kanban view ID (default: the project's kanban view)")]
    pub view_id: Option<i64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateBucketParams {
    #[schemars(description = "Project ID")]
    pub project_id: i64,
    #[schemars(description = "Bucket title")]
    pub title: String,
    #[schemars(description = "Kanban view ID (default: the project's kanban view)")]
    pub view_id: Option<i64>,
    #[schemars(description = "Maximum number of tasks (0: unlimited)")]
    pub limit: Option<i64>,
    #[schemars(description = "Bucket position (0: append)")]
    pub position: Option<f64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetTaskPositionParams {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[schemars(description = "Project ID the task belongs to")]
    pub project_id: i64,
    #[schemars(description = "Target bucket ID")]
    pub bucket_id: i64,
    #[schemars(description = "Kanban view ID (default: the project's kanban view)")]
    pub view_id: Option<i64>,
    #[schemars(description = "Position within the view (default: derived from the task ID)")]
    pub position: Option<f64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MoveTaskToBucketParams {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[schemars(description = "Project ID the task belongs to")]
    pub project_id: i64,
    #[schemars(
        description = "Bucket title. An exact case-insensitive match wins, otherwise a unique partial match"
    )]
    pub bucket: String,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

/// The given view, else the project's kanban view.
pub(crate) async fn view_or_kanban<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
    project_id: i64,
    view_id: Option<i64>,
) -> ToolResult<i64> {
    match view_id.filter(|id| *id > 0) {
        Some(id) => Ok(id),
        None => Ok(kanban_view(client, instance, project_id).await?.id),
    }
}

pub(crate) async fn list_view_buckets<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
    project_id: i64,
    view_id: i64,
) -> ToolResult<Vec<Bucket>> {
    Ok(client
        .get(
            &format!("/projects/{project_id}/views/{view_id}/buckets"),
            instance,
        )
        .await?)
}

#[tool_router(router = kanban_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "List the views (list, gantt, table, kanban) of a project.")]
    pub async fn list_views(
        &self,
        params: Parameters<ProjectViewsParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let project_id = params.0.project_id;
        finish(async {
            let views: Vec<ProjectView> = self
                .client
                .get(&format!("/projects/{project_id}/views"), instance)
                .await?;
            let rows: Vec<Value> = views
                .iter()
                .map(|v| json!({ "id": v.id, "title": v.title, "view_kind": v.view_kind }))
                .collect();
            Ok::<_, ToolError>(json!({ "views": rows }))
        }
        .await)
    }

    #[tool(description = "Find the kanban view of a project.")]
    pub async fn get_kanban_view(
        &self,
        params: Parameters<ProjectViewsParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let project_id = params.0.project_id;
        finish(async {
            let view = kanban_view(&self.client, instance, project_id).await?;
            Ok::<_, ToolError>(json!({ "view_id": view.id, "title": view.title }))
        }
        .await)
    }

    #[tool(description = "List the buckets of a kanban view with their task counts.")]
    pub async fn list_buckets(
        &self,
        params: Parameters<ListBucketsParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let project_id = params.0.project_id;
        let view_id = params.0.view_id;
        finish(async {
            let view_id = view_or_kanban(&self.client, instance, project_id, view_id).await?;
            let buckets = list_view_buckets(&self.client, instance, project_id, view_id).await?;
            let rows: Vec<Value> = buckets
                .iter()
                .map(|b| {
                    json!({
                        "id": b.id,
                        "title": b.title,
                        "position": b.position,
                        "limit": b.limit,
                        "task_count": b.tasks.len(),
                    })
                })
                .collect();
            Ok::<_, ToolError>(json!({ "view_id": view_id, "buckets": rows }))
        }
        .await)
    }

    #[tool(description = "Create a bucket in a kanban view.")]
    pub async fn create_bucket(
        &self,
        params: Parameters<CreateBucketParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        let project_id = p.project_id;
        finish(async {
            let view_id = view_or_kanban(&self.client, instance, project_id, p.view_id).await?;

            let mut body = Map::new();
            body.insert("title".into(), json!(p.title));
            if let Some(limit) = p.limit.filter(|l| *l != 0) {
                body.insert("limit".into(), json!(limit));
            }
            if let Some(position) = p.position.filter(|pos| *pos != 0.0) {
                body.insert("position".into(), json!(position));
            }

            let bucket: Bucket = self
                .client
                .put(
                    &format!("/projects/{project_id}/views/{view_id}/buckets"),
                    instance,
                    &body,
                )
                .await?;
            info!("Created bucket {} in view {}", bucket.title, view_id);
            Ok::<_, ToolError>(json!({ "id": bucket.id, "title": bucket.title }))
        }
        .await)
    }

    #[tool(description = "Move a task into a kanban bucket by bucket ID.")]
    pub async fn set_task_position(
        &self,
        params: Parameters<SetTaskPositionParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let view_id = view_or_kanban(&self.client, instance, p.project_id, p.view_id).await?;
            self.client
                .assign_to_bucket(
                    instance,
                    BucketAssignment {
                        project_id: p.project_id,
                        view_id,
                        bucket_id: p.bucket_id,
                        task_id: p.task_id,
                        position: p.position,
                    },
                )
                .await?;
            Ok::<_, ToolError>(json!({
                "task_id": p.task_id,
                "bucket_id": p.bucket_id,
                "moved": true,
            }))
        }
        .await)
    }

    #[tool(
        description = "Move a task into a kanban bucket by bucket title, e.g. 'done' or 'review'."
    )]
    pub async fn move_task_to_bucket(
        &self,
        params: Parameters<MoveTaskToBucketParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let view = kanban_view(&self.client, instance, p.project_id).await?;
            let buckets = list_view_buckets(&self.client, instance, p.project_id, view.id).await?;
            let bucket = match_bucket(&buckets, &p.bucket)?;

            self.client
                .assign_to_bucket(
                    instance,
                    BucketAssignment {
                        project_id: p.project_id,
                        view_id: view.id,
                        bucket_id: bucket.id,
                        task_id: p.task_id,
                        position: None,
                    },
                )
                .await?;
            info!("Moved task {} to bucket {}", p.task_id, bucket.title);
            Ok::<_, ToolError>(json!({
                "task_id": p.task_id,
                "bucket_id": bucket.id,
                "bucket": bucket.title,
                "moved": true,
            }))
        }
        .await)
    }
}
