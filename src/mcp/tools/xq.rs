//! X-Q: the exchange queue for handing work between agents
//!
//! Each instance may name one queue project in the config file. Its kanban
//! board has three buckets that a handoff moves through: new items land in
//! Handoff, a claimed item sits in Review, and a completed item is Filed.

use chrono::Utc;
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
use tracing::{info, warn};

use crate::client::{Bucket, BucketAssignment, Task, VikunjaClient};
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::kanban::list_view_buckets;
use crate::mcp::tools::{ToolError, ToolResult, finish, kanban_view, non_empty, preview};

pub const HANDOFF_BUCKET: &str = "📬 Handoff";
pub const REVIEW_BUCKET: &str = "🔍 Review";
pub const FILED_BUCKET: &str = "✅ Filed";

const XQ_BUCKETS: [&str; 3] = [HANDOFF_BUCKET, REVIEW_BUCKET, FILED_BUCKET];

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CheckXqParams {
    #[schemars(description = "Only check this instance's queue (default: all)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetupXqParams {
    #[schemars(
        description = "Project to use as the queue (default: the project already configured for the instance)"
    )]
    pub project_id: Option<i64>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClaimXqTaskParams {
    #[schemars(description = "Task ID in the queue project")]
    pub task_id: i64,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CompleteXqTaskParams {
    #[schemars(description = "Task ID in the queue project")]
    pub task_id: i64,
    #[schemars(description = "Where the item was filed, e.g. a path or URL")]
    pub destination: String,
    #[schemars(description = "Optional notes appended to the task")]
    pub notes: Option<String>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

/// A resolved queue: instance name, project, kanban view and its buckets.
struct Queue {
    instance: String,
    project_id: i64,
    view_id: i64,
    buckets: Vec<Bucket>,
}

impl Queue {
    fn bucket(&self, title: &str, missing: &str) -> ToolResult<i64> {
        self.buckets
            .iter()
            .find(|b| b.title == title)
            .map(|b| b.id)
            .ok_or_else(|| ToolError::recoverable(missing))
    }
}

async fn open_queue<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
) -> ToolResult<Queue> {
    let name = client.resolver().credentials(instance)?.name;
    let project_id = client
        .resolver()
        .xq_project(&name)?
        .ok_or_else(|| ToolError::recoverable(format!("X-Q not configured for '{name}'")))?;

    let view = match kanban_view(client, Some(&name), project_id).await {
        Ok(view) => view,
        Err(ToolError::Recoverable(message)) => {
            return Err(ToolError::recoverable(format!(
                "{message}. Run setup_xq first."
            )));
        }
        Err(e) => return Err(e),
    };
    let buckets = list_view_buckets(client, Some(&name), project_id, view.id).await?;

    Ok(Queue {
        instance: name,
        project_id,
        view_id: view.id,
        buckets,
    })
}

#[tool_router(router = xq_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(
        description = "List pending handoff items in the X-Q of every configured instance (or one)."
    )]
    pub async fn check_xq(
        &self,
        params: Parameters<CheckXqParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = non_empty(&params.0.instance);
        finish(async {
            let queues = self.client.resolver().xq_projects()?;
            if queues.is_empty() {
                return Err(ToolError::recoverable(
                    "No X-Q configured. Add 'xq' section to ~/.vikunja-mcp/config.yaml",
                ));
            }
            if let Some(name) = filter.filter(|n| !queues.contains_key(*n)) {
                return Err(ToolError::recoverable(format!(
                    "X-Q not configured for '{name}'"
                )));
            }

            let mut pending: Vec<Value> = Vec::new();
            let mut count = 0;
            for (name, project_id) in &queues {
                if filter.is_some_and(|f| f != name.as_str()) {
                    continue;
                }
                let path = format!("/projects/{project_id}/tasks");
                match self.client.get::<Vec<Task>>(&path, Some(name.as_str())).await {
                    Ok(tasks) => {
                        for task in tasks.iter().filter(|t| !t.done) {
                            count += 1;
                            pending.push(json!({
                                "id": task.id,
                                "title": task.title,
                                "description": preview(&task.description),
                                "instance": name,
                                "project_id": project_id,
                            }));
                        }
                    }
                    Err(e) => {
                        warn!("Failed to check X-Q on {}: {}", name, e);
                        pending.push(json!({ "instance": name, "error": e.to_string() }));
                    }
                }
            }
            Ok::<_, ToolError>(json!({ "pending": pending, "count": count }))
        }
        .await)
    }

    #[tool(
        description = "Prepare a project as the X-Q of an instance: records it in the config and creates any missing Handoff, Review and Filed buckets."
    )]
    pub async fn setup_xq(
        &self,
        params: Parameters<SetupXqParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let resolver = self.client.resolver();
            let name = resolver.credentials(instance)?.name;
            let project_id = match p.project_id.filter(|id| *id > 0) {
                Some(id) => id,
                None => resolver.xq_project(&name)?.ok_or_else(|| {
                    ToolError::recoverable(format!(
                        "X-Q not configured for '{name}'. Pass project_id to set it up."
                    ))
                })?,
            };

            let view = kanban_view(&self.client, Some(&name), project_id).await?;
            let buckets = list_view_buckets(&self.client, Some(&name), project_id, view.id).await?;

            let mut created = Vec::new();
            let mut existing = Vec::new();
            for title in XQ_BUCKETS {
                if buckets.iter().any(|b| b.title == title) {
                    existing.push(title);
                    continue;
                }
                let _: Bucket = self
                    .client
                    .put(
                        &format!("/projects/{project_id}/views/{}/buckets", view.id),
                        Some(&name),
                        &json!({ "title": title }),
                    )
                    .await?;
                created.push(title);
            }

            resolver.set_xq_project(&name, project_id)?;
            info!(
                "X-Q ready on {} (project {}, {} buckets created)",
                name,
                project_id,
                created.len()
            );
            Ok::<_, ToolError>(json!({
                "instance": name,
                "project_id": project_id,
                "created": created,
                "existing": existing,
            }))
        }
        .await)
    }

    #[tool(description = "Claim a handoff item: moves it to the Review bucket.")]
    pub async fn claim_xq_task(
        &self,
        params: Parameters<ClaimXqTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let instance = non_empty(&params.0.instance);
        let task_id = params.0.task_id;
        finish(async {
            let queue = open_queue(&self.client, instance).await?;
            let bucket_id =
                queue.bucket(REVIEW_BUCKET, "No Review bucket. Run setup_xq first.")?;
            let task: Task = self
                .client
                .get(&format!("/tasks/{task_id}"), Some(&queue.instance))
                .await?;

            self.client
                .assign_to_bucket(
                    Some(&queue.instance),
                    BucketAssignment {
                        project_id: queue.project_id,
                        view_id: queue.view_id,
                        bucket_id,
                        task_id,
                        position: None,
                    },
                )
                .await?;
            info!("Claimed X-Q task {} on {}", task_id, queue.instance);
            Ok::<_, ToolError>(json!({
                "claimed": task_id,
                "title": task.title,
                "description": task.description,
                "moved_to": REVIEW_BUCKET,
                "instance": queue.instance,
            }))
        }
        .await)
    }

    #[tool(
        description = "Complete a handoff item: appends where it was filed (and any notes) to the description, marks it done and moves it to the Filed bucket."
    )]
    pub async fn complete_xq_task(
        &self,
        params: Parameters<CompleteXqTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        let task_id = p.task_id;
        finish(async {
            let queue = open_queue(&self.client, instance).await?;
            let bucket_id = queue.bucket(FILED_BUCKET, "No Filed bucket. Run setup_xq first.")?;
            let path = format!("/tasks/{task_id}");
            let task: Task = self.client.get(&path, Some(&queue.instance)).await?;

            let mut description = format!(
                "{}\n\n---\n**Filed to:** `{}`\n**Filed at:** {}",
                task.description,
                p.destination,
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
            );
            if let Some(notes) = non_empty(&p.notes) {
                description.push_str(&format!("\n**Notes:** {notes}"));
            }

            let _: Task = self
                .client
                .post(
                    &path,
                    Some(&queue.instance),
                    &json!({ "description": description, "done": true }),
                )
                .await?;
            self.client
                .assign_to_bucket(
                    Some(&queue.instance),
                    BucketAssignment {
                        project_id: queue.project_id,
                        view_id: queue.view_id,
                        bucket_id,
                        task_id,
                        position: None,
                    },
                )
                .await?;
            info!(
                "Filed X-Q task {} to {} on {}",
                task_id, p.destination, queue.instance
            );
            Ok::<_, ToolError>(json!({
                "filed": task_id,
                "title": task.title,
                "destination": p.destination,
                "instance": queue.instance,
            }))
        }
        .await)
    }
}
