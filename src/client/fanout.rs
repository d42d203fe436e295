//! Requests repeated across every configured instance.
//!
//! Calls are issued one after another. A failing instance is logged and left
//! out of the result; it never fails the whole aggregation.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::api_client::VikunjaClient;
use super::error::ApiResult;
use super::models::{Project, Task};
use crate::instances::Environment;

/// A record together with the instance it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tagged<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "_instance")]
    pub instance: String,
}

/// An open task with its origin instance and project title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "_instance")]
    pub instance: String,
    #[serde(rename = "_project_title")]
    pub project_title: String,
}

impl<E: Environment> VikunjaClient<E> {
    /// Instance names in resolution order, reduced to `filter` when it is
    /// non-empty. An unknown filter yields no instances.
    pub fn instance_names(&self, filter: Option<&str>) -> ApiResult<Vec<String>> {
        let instances = self.resolver().resolve_instances()?;
        Ok(instances
            .into_keys()
            .filter(|name| filter.is_none_or(|f| f.is_empty() || name.as_str() == f))
            .collect())
    }

    /// Issue the same request against each instance. List responses are
    /// flattened; every record is tagged with its instance name.
    pub async fn for_each_instance<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        filter: Option<&str>,
    ) -> ApiResult<Vec<Tagged<T>>> {
        let mut results = Vec::new();

        for name in self.instance_names(filter)? {
            let value = match self.request(method.clone(), path, Some(&name), None).await {
                Ok(value) => value,
                Err(e) => {
                    warn!("Request to {} failed: {}", name, e);
                    continue;
                }
            };

            let items = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            let decoded: Result<Vec<T>, _> =
                items.into_iter().map(serde_json::from_value).collect();
            match decoded {
                Ok(items) => results.extend(items.into_iter().map(|item| Tagged {
                    item,
                    instance: name.clone(),
                })),
                Err(e) => warn!("Unexpected response from {}: {}", name, e),
            }
        }

        Ok(results)
    }

    /// Every open task in every project of each instance.
    ///
    /// One call lists the projects of an instance, then one call per project
    /// lists its tasks. Done tasks are dropped.
    pub async fn all_open_tasks(&self, filter: Option<&str>) -> ApiResult<Vec<AggregatedTask>> {
        let mut all = Vec::new();

        for name in self.instance_names(filter)? {
            let projects: Vec<Project> = match self.get("/projects", Some(&name)).await {
                Ok(projects) => projects,
                Err(e) => {
                    warn!("Failed to get tasks from {}: {}", name, e);
                    continue;
                }
            };

            for project in projects {
                let path = format!("/projects/{}/tasks", project.id);
                let tasks: Vec<Task> = match self.get(&path, Some(&name)).await {
                    Ok(tasks) => tasks,
                    Err(e) => {
                        debug!("Skipping project {} on {}: {}", project.id, name, e);
                        continue;
                    }
                };

                all.extend(tasks.into_iter().filter(|t| !t.done).map(|task| {
                    AggregatedTask {
                        task,
                        instance: name.clone(),
                        project_title: project.title.clone(),
                    }
                }));
            }
        }

        debug!("Aggregated {} open tasks", all.len());
        Ok(all)
    }
}
