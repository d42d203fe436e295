//! Task relation tools

use indexmap::IndexMap;
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::*,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::Task;
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, finish, non_empty};

/// Relation kinds Vikunja accepts.
pub const RELATION_KINDS: &[&str] = &[
    "subtask",
    "parenttask",
    "related",
    "duplicateof",
    "duplicates",
    "blocking",
    "blocked",
    "precedes",
    "follows",
    "copiedfrom",
    "copiedto",
];

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskRelationParams {
    #[schemars(description = "Task ID the relation starts from")]
    pub task_id: i64,
    #[schemars(description = "Related task ID")]
    pub other_task_id: i64,
    #[schemars(
        description = "Relation kind: subtask, parenttask, related, duplicateof, duplicates, blocking, blocked, precedes, follows, copiedfrom, copiedto"
    )]
    pub relation_kind: String,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListTaskRelationsParams {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[tool_router(router = relation_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "Relate two tasks, e.g. make one a subtask of or blocking another.")]
    pub async fn create_task_relation(
        &self,
        params: Parameters<CreateTaskRelationParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let kind = p.relation_kind.trim().to_lowercase();
            if !RELATION_KINDS.contains(&kind.as_str()) {
                return Err(ToolError::recoverable(format!(
                    "Unknown relation kind '{}'. Valid: {}",
                    p.relation_kind,
                    RELATION_KINDS.join(", ")
                )));
            }

            let _: Value = self
                .client
                .put(
                    &format!("/tasks/{}/relations", p.task_id),
                    instance,
                    &json!({ "other_task_id": p.other_task_id, "relation_kind": kind }),
                )
                .await?;
            Ok::<_, ToolError>(json!({
                "task_id": p.task_id,
                "relation_kind": kind,
                "other_task_id": p.other_task_id,
            }))
        }
        .await)
    }

    #[tool(description = "List a task's relations grouped by kind.")]
    pub async fn list_task_relations(
        &self,
        params: Parameters<ListTaskRelationsParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.task_id;
        finish(async {
            let task: Task = self.client.get(&format!("/tasks/{id}"), instance).await?;
            let relations: IndexMap<&str, Vec<Value>> = task
                .related_tasks
                .iter()
                .map(|(kind, tasks)| {
                    let rows = tasks
                        .iter()
                        .map(|t| json!({ "id": t.id, "title": t.title, "done": t.done }))
                        .collect();
                    (kind.as_str(), rows)
                })
                .collect();
            Ok::<_, ToolError>(json!({ "task_id": task.id, "relations": relations }))
        }
        .await)
    }
}
