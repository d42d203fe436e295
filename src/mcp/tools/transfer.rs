//! Project export and import
//!
//! The export document is plain JSON so it can be copied between instances:
//! projects carry their original ids only to rebuild the hierarchy on import.

use std::collections::HashMap;

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
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::client::{Label, Project, Task, VikunjaClient};
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, ToolResult, finish, non_empty};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportedTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Label titles.
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportedProject {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hex_color: String,
    #[serde(default)]
    pub parent_project_id: i64,
    #[serde(default)]
    pub tasks: Vec<ExportedTask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportDocument {
    #[serde(default)]
    pub exported_at: String,
    #[serde(default)]
    pub instance: String,
    pub projects: Vec<ExportedProject>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExportProjectsParams {
    #[schemars(description = "Only export these projects (default: all)")]
    pub project_ids: Option<Vec<i64>>,
    #[schemars(description = "Instance name (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImportProjectsParams {
    #[schemars(description = "Document produced by export_projects")]
    pub data: ExportDocument,
    #[schemars(
        description = "Reuse projects and skip tasks whose title already exists (case-insensitive). Default: true"
    )]
    pub skip_existing: Option<bool>,
    #[schemars(description = "Instance to import into (default: current)")]
    pub instance: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct ImportReport {
    projects_created: usize,
    projects_reused: usize,
    tasks_created: usize,
    tasks_skipped: usize,
    project_id_map: HashMap<String, i64>,
    failed: Vec<Value>,
}

/// Order projects so every parent that is part of the export comes before
/// its children. Cycles are broken by appending the rest as-is.
pub(crate) fn parents_first(projects: &[ExportedProject]) -> Vec<&ExportedProject> {
    let mut ordered: Vec<&ExportedProject> = Vec::with_capacity(projects.len());
    let mut pending: Vec<&ExportedProject> = projects.iter().collect();

    while !pending.is_empty() {
        let before = pending.len();
        let (ready, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(|p| {
            p.parent_project_id == 0
                || !projects.iter().any(|q| q.id == p.parent_project_id)
                || ordered.iter().any(|q| q.id == p.parent_project_id)
        });
        ordered.extend(ready);
        pending = rest;
        if pending.len() == before {
            ordered.append(&mut pending);
        }
    }
    ordered
}

async fn label_id<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
    labels: &mut HashMap<String, i64>,
    title: &str,
) -> ToolResult<i64> {
    let key = title.to_lowercase();
    if let Some(id) = labels.get(&key) {
        return Ok(*id);
    }
    let created: Label = client
        .put("/labels", instance, &json!({ "title": title }))
        .await?;
    labels.insert(key, created.id);
    Ok(created.id)
}

#[tool_router(router = transfer_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(
        description = "Export projects with all their tasks as one JSON document, suitable for import_projects."
    )]
    pub async fn export_projects(
        &self,
        params: Parameters<ExportProjectsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        finish(async {
            let name = self.client.resolver().credentials(instance)?.name;
            let projects: Vec<Project> = self.client.get("/projects", instance).await?;

            let mut exported = Vec::new();
            for project in projects {
                if p.project_ids
                    .as_ref()
                    .is_some_and(|ids| !ids.contains(&project.id))
                {
                    continue;
                }
                let tasks: Vec<Task> = self
                    .client
                    .get(&format!("/projects/{}/tasks", project.id), instance)
                    .await?;
                exported.push(ExportedProject {
                    id: project.id,
                    title: project.title,
                    description: project.description,
                    hex_color: project.hex_color,
                    parent_project_id: project.parent_project_id,
                    tasks: tasks
                        .iter()
                        .map(|t| ExportedTask {
                            title: t.title.clone(),
                            description: t.description.clone(),
                            done: t.done,
                            priority: t.priority,
                            due_date: t.due().map(str::to_string),
                            labels: t.label_titles(),
                        })
                        .collect(),
                });
            }

            info!("Exported {} projects from {}", exported.len(), name);
            Ok::<_, ToolError>(ExportDocument {
                exported_at: Utc::now().to_rfc3339(),
                instance: name,
                projects: exported,
            })
        }
        .await)
    }

    #[tool(
        description = "Import a document from export_projects. Parent projects are remapped to the new ids. With skip_existing, projects with a matching title are reused and tasks with a matching title are skipped."
    )]
    pub async fn import_projects(
        &self,
        params: Parameters<ImportProjectsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = &params.0;
        let instance = non_empty(&p.instance);
        let skip_existing = p.skip_existing.unwrap_or(true);
        finish(async {
            let existing: Vec<Project> = self.client.get("/projects", instance).await?;
            let existing: HashMap<String, i64> = existing
                .into_iter()
                .map(|project| (project.title.to_lowercase(), project.id))
                .collect();
            let mut labels: HashMap<String, i64> = self
                .client
                .get::<Vec<Label>>("/labels", instance)
                .await?
                .into_iter()
                .map(|l| (l.title.to_lowercase(), l.id))
                .collect();

            let mut report = ImportReport::default();
            let mut id_map: HashMap<i64, i64> = HashMap::new();

            for project in parents_first(&p.data.projects) {
                let reused = skip_existing
                    .then(|| existing.get(&project.title.to_lowercase()).copied())
                    .flatten();

                let new_id = match reused {
                    Some(id) => {
                        report.projects_reused += 1;
                        id
                    }
                    None => {
                        let mut body = Map::new();
                        body.insert("title".into(), json!(project.title));
                        body.insert("description".into(), json!(project.description));
                        if !project.hex_color.is_empty() {
                            body.insert("hex_color".into(), json!(project.hex_color));
                        }
                        if let Some(parent) = id_map.get(&project.parent_project_id) {
                            body.insert("parent_project_id".into(), json!(parent));
                        }
                        match self.client.put::<Project, _>("/projects", instance, &body).await {
                            Ok(created) => {
                                report.projects_created += 1;
                                created.id
                            }
                            Err(e) => {
                                warn!("Failed to import project '{}': {}", project.title, e);
                                report
                                    .failed
                                    .push(json!({ "project": project.title, "error": e.to_string() }));
                                continue;
                            }
                        }
                    }
                };
                id_map.insert(project.id, new_id);
                report
                    .project_id_map
                    .insert(project.id.to_string(), new_id);

                let tasks_path = format!("/projects/{new_id}/tasks");
                let known_tasks: Vec<String> = if reused.is_some() {
                    self.client
                        .get::<Vec<Task>>(&tasks_path, instance)
                        .await?
                        .into_iter()
                        .map(|t| t.title.to_lowercase())
                        .collect()
                } else {
                    Vec::new()
                };

                for task in &project.tasks {
                    if known_tasks.contains(&task.title.to_lowercase()) {
                        report.tasks_skipped += 1;
                        continue;
                    }
                    let mut body = Map::new();
                    body.insert("title".into(), json!(task.title));
                    body.insert("description".into(), json!(task.description));
                    body.insert("done".into(), json!(task.done));
                    body.insert("priority".into(), json!(task.priority));
                    if let Some(due) = non_empty(&task.due_date) {
                        body.insert("due_date".into(), json!(due));
                    }

                    let created = match self.client.put::<Task, _>(&tasks_path, instance, &body).await
                    {
                        Ok(created) => created,
                        Err(e) => {
                            report
                                .failed
                                .push(json!({ "task": task.title, "error": e.to_string() }));
                            continue;
                        }
                    };
                    report.tasks_created += 1;

                    for title in &task.labels {
                        let attached = async {
                            let id = label_id(&self.client, instance, &mut labels, title).await?;
                            self.client
                                .put::<Value, _>(
                                    &format!("/tasks/{}/labels", created.id),
                                    instance,
                                    &json!({ "label_id": id }),
                                )
                                .await?;
                            Ok::<_, ToolError>(())
                        }
                        .await;
                        if let Err(e) = attached {
                            report.failed.push(
                                json!({ "task": task.title, "label": title, "error": e.to_string() }),
                            );
                        }
                    }
                }
            }

            info!(
                "Imported {} projects ({} reused), {} tasks",
                report.projects_created, report.projects_reused, report.tasks_created
            );
            Ok::<_, ToolError>(report)
        }
        .await)
    }
}
