//! Batch and bulk tools
//!
//! Every item is attempted on its own. A failing item is reported next to the
//! successful ones and never stops the rest of the batch.

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
use tracing::{info, warn};

use crate::client::{BucketAssignment, Task};
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::kanban::view_or_kanban;
use crate::mcp::tools::tasks::{NewTask, TaskChanges};
use crate::mcp::tools::{ToolError, finish, non_empty, project_or_default};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BatchCreateTasksParams {
    #[schemars(description = "Project ID (default: the session's default project)")]
    pub project_id: Option<i64>,
    #[schemars(description = "Tasks to create")]
    pub tasks: Vec<NewTask>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskUpdate {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[serde(flatten)]
    pub changes: TaskChanges,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BatchUpdateTasksParams {
    #[schemars(description = "Updates to apply; each names a task_id plus the fields to change")]
    pub updates: Vec<TaskUpdate>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BulkRelabelTasksParams {
    #[schemars(description = "Tasks to relabel")]
    pub task_ids: Vec<i64>,
    #[schemars(description = "Label IDs to attach")]
    pub add_label_ids: Option<Vec<i64>>,
    #[schemars(description = "Label IDs to detach")]
    pub remove_label_ids: Option<Vec<i64>>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BulkSetTaskPositionsParams {
    #[schemars(description = "Project ID the tasks belong to")]
    pub project_id: i64,
    #[schemars(description = "Target bucket ID")]
    pub bucket_id: i64,
    #[schemars(description = "Tasks to move")]
    pub task_ids: Vec<i64>,
    #[schemars(description = "Kanban view ID (default: the project's kanban view)")]
    pub view_id: Option<i64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

fn failure(key: &str, id: Value, error: impl ToString) -> Value {
    let mut entry = Map::new();
    entry.insert(key.to_string(), id);
    entry.insert("error".into(), json!(error.to_string()));
    Value::Object(entry)
}

#[tool_router(router = batch_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "Create several tasks in one project. Failures are reported per task.")]
    pub async fn batch_create_tasks(
        &self,
        params: Parameters<BatchCreateTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let project_id = project_or_default(&self.client, p.project_id)?;
            self.client.resolver().credentials(instance)?;
            let path = format!("/projects/{project_id}/tasks");

            let mut created = Vec::new();
            let mut failed = Vec::new();
            for task in &p.tasks {
                match self.client.put::<Task, _>(&path, instance, &task.body()).await {
                    Ok(t) => created.push(json!({ "id": t.id, "title": t.title })),
                    Err(e) => {
                        warn!("Failed to create task '{}': {}", task.title, e);
                        failed.push(failure("title", json!(task.title), e));
                    }
                }
            }

            info!(
                "Batch created {} tasks in project {} ({} failed)",
                created.len(),
                project_id,
                failed.len()
            );
            Ok::<_, ToolError>(json!({
                "project_id": project_id,
                "created": created,
                "failed": failed,
            }))
        }
        .await)
    }

    #[tool(
        description = "Update several tasks. Each update names a task_id and the fields to change, with the same keep rules as update_task."
    )]
    pub async fn batch_update_tasks(
        &self,
        params: Parameters<BatchUpdateTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            self.client.resolver().credentials(instance)?;

            let mut updated = Vec::new();
            let mut failed = Vec::new();
            for update in &p.updates {
                let Some(body) = update.changes.body() else {
                    failed.push(failure("task_id", json!(update.task_id), "No changes specified"));
                    continue;
                };
                let path = format!("/tasks/{}", update.task_id);
                match self.client.post::<Task, _>(&path, instance, &body).await {
                    Ok(t) => updated.push(json!({ "id": t.id, "title": t.title })),
                    Err(e) => failed.push(failure("task_id", json!(update.task_id), e)),
                }
            }
            Ok::<_, ToolError>(json!({ "updated": updated, "failed": failed }))
        }
        .await)
    }

    #[tool(description = "Attach and/or detach labels on many tasks at once.")]
    pub async fn bulk_relabel_tasks(
        &self,
        params: Parameters<BulkRelabelTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        let add = p.add_label_ids.clone().unwrap_or_default();
        let remove = p.remove_label_ids.clone().unwrap_or_default();
        finish(async {
            if add.is_empty() && remove.is_empty() {
                return Err(ToolError::recoverable("No label changes specified"));
            }
            self.client.resolver().credentials(instance)?;

            let mut updated = Vec::new();
            let mut failed = Vec::new();
            'tasks: for &task_id in &p.task_ids {
                for &label_id in &add {
                    let path = format!("/tasks/{task_id}/labels");
                    let body = json!({ "label_id": label_id });
                    if let Err(e) = self.client.put::<Value, _>(&path, instance, &body).await {
                        failed.push(failure("task_id", json!(task_id), e));
                        continue 'tasks;
                    }
                }
                for &label_id in &remove {
                    let path = format!("/tasks/{task_id}/labels/{label_id}");
                    if let Err(e) = self.client.delete(&path, instance).await {
                        failed.push(failure("task_id", json!(task_id), e));
                        continue 'tasks;
                    }
                }
                updated.push(task_id);
            }
            Ok::<_, ToolError>(json!({ "updated": updated, "failed": failed }))
        }
        .await)
    }

    #[tool(description = "Move many tasks into one kanban bucket.")]
    pub async fn bulk_set_task_positions(
        &self,
        params: Parameters<BulkSetTaskPositionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let view_id = view_or_kanban(&self.client, instance, p.project_id, p.view_id).await?;

            let mut moved = Vec::new();
            let mut failed = Vec::new();
            for &task_id in &p.task_ids {
                let assignment = BucketAssignment {
                    project_id: p.project_id,
                    view_id,
                    bucket_id: p.bucket_id,
                    task_id,
                    position: None,
                };
                match self.client.assign_to_bucket(instance, assignment).await {
                    Ok(()) => moved.push(task_id),
                    Err(e) => failed.push(failure("task_id", json!(task_id), e)),
                }
            }
            Ok::<_, ToolError>(json!({
                "bucket_id": p.bucket_id,
                "moved": moved,
                "failed": failed,
            }))
        }
        .await)
    }
}
