//! Task tools
//!
//! [`NewTask`] and [`TaskChanges`] are shared with the batch tools so a
//! single create or update and a batched one send identical bodies.

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

use crate::client::Task;
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, expand_date, finish, non_empty, preview, project_or_default};

/// Fields of a task to create.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewTask {
    #[schemars(description = "Task title")]
    pub title: String,
    #[schemars(description = "Task description (markdown or HTML)")]
    pub description: Option<String>,
    #[schemars(description = "Due date, YYYY-MM-DD or full ISO timestamp")]
    pub due_date: Option<String>,
    #[schemars(description = "Start date, YYYY-MM-DD or full ISO timestamp")]
    pub start_date: Option<String>,
    #[schemars(description = "End date, YYYY-MM-DD (expanded to 23:59) or full ISO timestamp")]
    pub end_date: Option<String>,
    #[schemars(description = "Priority 0-5 (5 = do now)")]
    pub priority: Option<i64>,
    #[schemars(description = "Repeat interval in seconds (0: no repeat)")]
    pub repeat_after: Option<i64>,
    #[schemars(description = "Repeat mode: 0 = after interval, 1 = monthly, 2 = from current date")]
    pub repeat_mode: Option<i64>,
}

impl NewTask {
    pub(crate) fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("title".into(), json!(self.title));
        if let Some(description) = non_empty(&self.description) {
            body.insert("description".into(), json!(description));
        }
        insert_dates(
            &mut body,
            &self.due_date,
            &self.start_date,
            &self.end_date,
        );
        if let Some(priority) = self.priority.filter(|p| *p > 0) {
            body.insert("priority".into(), json!(priority));
        }
        if let Some(repeat_after) = self.repeat_after.filter(|r| *r > 0) {
            body.insert("repeat_after".into(), json!(repeat_after));
            body.insert("repeat_mode".into(), json!(self.repeat_mode.unwrap_or(0).max(0)));
        }
        body
    }
}

/// Changes to an existing task. Empty strings and `-1` keep the current
/// value.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskChanges {
    #[schemars(description = "New title (empty keeps)")]
    pub title: Option<String>,
    #[schemars(description = "New description (empty keeps)")]
    pub description: Option<String>,
    #[schemars(description = "New due date (empty keeps)")]
    pub due_date: Option<String>,
    #[schemars(description = "New start date (empty keeps)")]
    pub start_date: Option<String>,
    #[schemars(description = "New end date (empty keeps)")]
    pub end_date: Option<String>,
    #[schemars(description = "New priority 0-5 (-1 keeps)")]
    pub priority: Option<i64>,
    #[schemars(description = "Mark done or not done")]
    pub done: Option<bool>,
    #[schemars(description = "New repeat interval in seconds (-1 keeps, 0 stops repeating)")]
    pub repeat_after: Option<i64>,
    #[schemars(description = "New repeat mode (-1 keeps)")]
    pub repeat_mode: Option<i64>,
}

impl TaskChanges {
    /// Request body with only the changed fields; `None` when nothing changes.
    pub(crate) fn body(&self) -> Option<Map<String, Value>> {
        let mut body = Map::new();
        if let Some(title) = non_empty(&self.title) {
            body.insert("title".into(), json!(title));
        }
        if let Some(description) = non_empty(&self.description) {
            body.insert("description".into(), json!(description));
        }
        insert_dates(
            &mut body,
            &self.due_date,
            &self.start_date,
            &self.end_date,
        );
        for (key, value) in [
            ("priority", self.priority),
            ("repeat_after", self.repeat_after),
            ("repeat_mode", self.repeat_mode),
        ] {
            if let Some(value) = value.filter(|v| *v >= 0) {
                body.insert(key.into(), json!(value));
            }
        }
        if let Some(done) = self.done {
            body.insert("done".into(), json!(done));
        }
        (!body.is_empty()).then_some(body)
    }
}

fn insert_dates(
    body: &mut Map<String, Value>,
    due: &Option<String>,
    start: &Option<String>,
    end: &Option<String>,
) {
    if let Some(due) = non_empty(due) {
        body.insert("due_date".into(), json!(expand_date(due, false)));
    }
    if let Some(start) = non_empty(start) {
        body.insert("start_date".into(), json!(expand_date(start, false)));
    }
    if let Some(end) = non_empty(end) {
        body.insert("end_date".into(), json!(expand_date(end, true)));
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListTasksParams {
    #[schemars(description = "Project ID (default: the session's default project)")]
    pub project_id: Option<i64>,
    #[schemars(description = "Include completed tasks (default: false)")]
    pub include_completed: Option<bool>,
    #[schemars(description = "Only tasks with a label containing this text (case-insensitive)")]
    pub label_filter: Option<String>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TaskIdParams {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    #[serde(flatten)]
    pub task: NewTask,
    #[schemars(description = "Project ID (default: the session's default project)")]
    pub project_id: Option<i64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTaskParams {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[serde(flatten)]
    pub changes: TaskChanges,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

fn task_row(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": preview(&t.description),
        "done": t.done,
        "priority": t.priority,
        "due_date": t.due(),
        "labels": t.label_titles(),
        "project_id": t.project_id,
    })
}

fn has_label(task: &Task, needle: &str) -> bool {
    task.labels
        .iter()
        .any(|l| l.title.to_lowercase().contains(needle))
}

#[tool_router(router = task_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(
        description = "List tasks in a project. Completed tasks are hidden unless include_completed is set. Descriptions are truncated to 200 characters."
    )]
    pub async fn list_tasks(
        &self,
        params: Parameters<ListTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let project_id = project_or_default(&self.client, p.project_id)?;
            let tasks: Vec<Task> = self
                .client
                .get(&format!("/projects/{project_id}/tasks"), instance)
                .await?;

            let include_completed = p.include_completed.unwrap_or(false);
            let needle = non_empty(&p.label_filter).map(str::to_lowercase);
            let rows: Vec<Value> = tasks
                .iter()
                .filter(|t| include_completed || !t.done)
                .filter(|t| needle.as_deref().is_none_or(|n| has_label(t, n)))
                .map(task_row)
                .collect();
            Ok::<_, ToolError>(json!({ "tasks": rows }))
        }
        .await)
    }

    #[tool(description = "Get a task with its dates, labels and bucket.")]
    pub async fn get_task(
        &self,
        params: Parameters<TaskIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.task_id;
        finish(async {
            let t: Task = self.client.get(&format!("/tasks/{id}"), instance).await?;
            let labels: Vec<Value> = t
                .labels
                .iter()
                .map(|l| json!({ "id": l.id, "title": l.title }))
                .collect();
            Ok::<_, ToolError>(json!({
                "id": t.id,
                "title": t.title,
                "description": t.description,
                "done": t.done,
                "priority": t.priority,
                "due_date": t.due_date,
                "start_date": t.start_date,
                "end_date": t.end_date,
                "labels": labels,
                "project_id": t.project_id,
                "bucket_id": t.bucket_id,
            }))
        }
        .await)
    }

    #[tool(
        description = "Create a task. Date-only values are expanded to midnight (end dates to 23:59). Set repeat_after (seconds) for recurring tasks."
    )]
    pub async fn create_task(
        &self,
        params: Parameters<CreateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let project_id = project_or_default(&self.client, p.project_id)?;
            let created: Task = self
                .client
                .put(
                    &format!("/projects/{project_id}/tasks"),
                    instance,
                    &p.task.body(),
                )
                .await?;
            info!("Created task {} in project {}", created.id, project_id);
            Ok::<_, ToolError>(json!({
                "id": created.id,
                "title": created.title,
                "project_id": created.project_id,
            }))
        }
        .await)
    }

    #[tool(
        description = "Update a task. Only the given fields change: empty strings keep the current value, priority/repeat_after/repeat_mode -1 keep."
    )]
    pub async fn update_task(
        &self,
        params: Parameters<UpdateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        let id = p.task_id;
        finish(async {
            let body = p
                .changes
                .body()
                .ok_or_else(|| ToolError::recoverable("No changes specified"))?;
            let updated: Task = self
                .client
                .post(&format!("/tasks/{id}"), instance, &body)
                .await?;
            Ok::<_, ToolError>(json!({
                "id": updated.id,
                "title": updated.title,
                "updated": true,
            }))
        }
        .await)
    }

    #[tool(description = "Mark a task as done.")]
    pub async fn complete_task(
        &self,
        params: Parameters<TaskIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.task_id;
        finish(async {
            let done: Task = self
                .client
                .post(&format!("/tasks/{id}"), instance, &json!({ "done": true }))
                .await?;
            Ok::<_, ToolError>(json!({ "id": done.id, "title": done.title, "done": true }))
        }
        .await)
    }

    #[tool(description = "Delete a task.")]
    pub async fn delete_task(
        &self,
        params: Parameters<TaskIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.task_id;
        finish(async {
            self.client.delete(&format!("/tasks/{id}"), instance).await?;
            info!("Deleted task {}", id);
            Ok::<_, ToolError>(json!({ "deleted": id }))
        }
        .await)
    }
}
