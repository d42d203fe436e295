//! Label tools

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

use crate::client::Label;
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, finish, non_empty};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListLabelsParams {
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateLabelParams {
    #[schemars(description = "Label title")]
    pub title: String,
    #[schemars(description = "Hex colour, with or without leading #")]
    pub hex_color: Option<String>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteLabelParams {
    #[schemars(description = "Label ID")]
    pub label_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TaskLabelParams {
    #[schemars(description = "Task ID")]
    pub task_id: i64,
    #[schemars(description = "Label ID")]
    pub label_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[tool_router(router = label_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "List all labels visible to the user.")]
    pub async fn list_labels(
        &self,
        params: Parameters<ListLabelsParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        finish(async {
            let labels: Vec<Label> = self.client.get("/labels", instance).await?;
            let rows: Vec<Value> = labels
                .iter()
                .map(|l| json!({ "id": l.id, "title": l.title, "hex_color": l.hex_color }))
                .collect();
            Ok::<_, ToolError>(json!({ "labels": rows }))
        }
        .await)
    }

    #[tool(description = "Create a label.")]
    pub async fn create_label(
        &self,
        params: Parameters<CreateLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let mut body = Map::new();
            body.insert("title".into(), json!(p.title));
            if let Some(color) = non_empty(&p.hex_color) {
                body.insert("hex_color".into(), json!(color.trim_start_matches('#')));
            }
            let label: Label = self.client.put("/labels", instance, &body).await?;
            Ok::<_, ToolError>(json!({ "id": label.id, "title": label.title }))
        }
        .await)
    }

    #[tool(description = "Delete a label. It is removed from every task that carries it.")]
    pub async fn delete_label(
        &self,
        params: Parameters<DeleteLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let id = params.0.label_id;
        finish(async {
            self.client.delete(&format!("/labels/{id}"), instance).await?;
            Ok::<_, ToolError>(json!({ "deleted": id }))
        }
        .await)
    }

    #[tool(description = "Attach a label to a task.")]
    pub async fn add_label_to_task(
        &self,
        params: Parameters<TaskLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let TaskLabelParams {
            task_id,
            label_id,
            ref instance,
        } = params.0;
        let instance = non_empty(instance);
        finish(async {
            let _: Value = self
                .client
                .put(
                    &format!("/tasks/{task_id}/labels"),
                    instance,
                    &json!({ "label_id": label_id }),
                )
                .await?;
            Ok::<_, ToolError>(json!({ "task_id": task_id, "label_id": label_id, "added": true }))
        }
        .await)
    }

    #[tool(description = "Remove a label from a task.")]
    pub async fn remove_label_from_task(
        &self,
        params: Parameters<TaskLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let TaskLabelParams {
            task_id,
            label_id,
            ref instance,
        } = params.0;
        let instance = non_empty(instance);
        finish(async {
            self.client
                .delete(&format!("/tasks/{task_id}/labels/{label_id}"), instance)
                .await?;
            Ok::<_, ToolError>(json!({ "task_id": task_id, "label_id": label_id, "removed": true }))
        }
        .await)
    }
}
