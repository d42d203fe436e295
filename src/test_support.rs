//! In-process fake Vikunja server and helpers shared by tests.
//!
//! The fake keeps projects, tasks, labels, views and buckets in memory and
//! answers the subset of the REST API this crate calls. Every request is
//! recorded so tests can assert on the exact calls made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::client::VikunjaClient;
use crate::config::{ConfigFile, ConfigStore, InstanceEntry};
use crate::instances::{Environment, InstanceResolver};
use crate::mcp::VikunjaMcpServer;

/// Fixed environment backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(pub HashMap<String, String>);

impl MapEnv {
    pub fn with(vars: &[(&str, &str)]) -> Self {
        Self(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// A request seen by the fake server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    token: String,
    failing: bool,
    next_id: i64,
    projects: Vec<Value>,
    tasks: Vec<Value>,
    labels: Vec<Value>,
    views: Vec<Value>,
    buckets: Vec<Value>,
    requests: Vec<Recorded>,
}

impl FakeState {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn create_project(&mut self, body: &Value) -> Value {
        let id = self.id();
        let mut project = json!({
            "id": id,
            "title": "",
            "description": "",
            "hex_color": "",
            "parent_project_id": 0,
            "is_favorite": false,
            "position": id as f64 * 65536.0,
        });
        merge(&mut project, body);
        project["id"] = json!(id);
        self.projects.push(project.clone());

        for (title, kind) in [("List", "list"), ("Kanban", "kanban")] {
            let view_id = self.id();
            self.views.push(json!({
                "id": view_id,
                "title": title,
                "project_id": id,
                "view_kind": kind,
            }));
        }
        project
    }

    fn create_task(&mut self, project_id: i64, body: &Value) -> Value {
        let id = self.id();
        let mut task = json!({
            "id": id,
            "title": "",
            "description": "",
            "done": false,
            "priority": 0,
            "due_date": "0001-01-01T00:00:00Z",
            "project_id": project_id,
            "bucket_id": 0,
            "labels": null,
            "related_tasks": {},
        });
        merge(&mut task, body);
        task["id"] = json!(id);
        task["project_id"] = json!(project_id);
        self.tasks.push(task.clone());
        task
    }

    fn task_mut(&mut self, id: i64) -> Option<&mut Value> {
        self.tasks.iter_mut().find(|t| t["id"] == json!(id))
    }

    fn handle(&mut self, method: &Method, segments: &[&str], body: &Value) -> (StatusCode, Value) {
        fn num(s: &str) -> Option<i64> {
            s.parse().ok()
        }
        let not_found = (StatusCode::NOT_FOUND, json!({"message": "Not found"}));

        match (method.as_str(), segments) {
            ("GET", ["user"]) => (StatusCode::OK, json!({"id": 1, "username": "tester"})),

            ("GET", ["projects"]) => (StatusCode::OK, Value::Array(self.projects.clone())),
            ("PUT", ["projects"]) => (StatusCode::CREATED, self.create_project(body)),
            ("GET", ["projects", id]) => find(&self.projects, num(id)).map_or(not_found, ok),
            ("POST", ["projects", id]) => {
                let id = num(id);
                match self.projects.iter_mut().find(|p| p["id"].as_i64() == id) {
                    Some(project) => {
                        merge(project, body);
                        (StatusCode::OK, project.clone())
                    }
                    None => not_found,
                }
            }
            ("DELETE", ["projects", id]) => {
                let id = num(id);
                self.projects.retain(|p| p["id"].as_i64() != id);
                (StatusCode::OK, json!({"message": "Successfully deleted."}))
            }

            ("GET", ["projects", id, "tasks"]) => {
                let id = num(id);
                let tasks: Vec<Value> = self
                    .tasks
                    .iter()
                    .filter(|t| t["project_id"].as_i64() == id)
                    .cloned()
                    .collect();
                (StatusCode::OK, Value::Array(tasks))
            }
            ("PUT", ["projects", id, "tasks"]) => match find(&self.projects, num(id)) {
                Some(project) => {
                    let id = project["id"].as_i64().unwrap_or_default();
                    (StatusCode::CREATED, self.create_task(id, body))
                }
                None => not_found,
            },

            ("GET", ["tasks", id]) => find(&self.tasks, num(id)).map_or(not_found, ok),
            ("POST", ["tasks", id]) => match num(id).and_then(|id| self.task_mut(id)) {
                Some(task) => {
                    merge(task, body);
                    (StatusCode::OK, task.clone())
                }
                None => not_found,
            },
            ("DELETE", ["tasks", id]) => {
                let id = num(id);
                self.tasks.retain(|t| t["id"].as_i64() != id);
                (StatusCode::OK, json!({"message": "Successfully deleted."}))
            }
            ("POST", ["tasks", _, "position"]) => (StatusCode::OK, body.clone()),

            ("PUT", ["tasks", id, "labels"]) => {
                let label = find(&self.labels, body["label_id"].as_i64());
                match (label, num(id).and_then(|id| self.task_mut(id))) {
                    (Some(label), Some(task)) => {
                        if !task["labels"].is_array() {
                            task["labels"] = json!([]);
                        }
                        if let Some(labels) = task["labels"].as_array_mut() {
                            labels.push(label);
                        }
                        (StatusCode::CREATED, json!({"label_id": body["label_id"]}))
                    }
                    _ => not_found,
                }
            }
            ("DELETE", ["tasks", id, "labels", label_id]) => {
                let label_id = num(label_id);
                match num(id).and_then(|id| self.task_mut(id)) {
                    Some(task) => {
                        if let Some(labels) = task["labels"].as_array_mut() {
                            labels.retain(|l| l["id"].as_i64() != label_id);
                        }
                        (StatusCode::OK, json!({"message": "The label was successfully removed."}))
                    }
                    None => not_found,
                }
            }
            ("PUT", ["tasks", id, "relations"]) => {
                let other = find(&self.tasks, body["other_task_id"].as_i64());
                let kind = body["relation_kind"].as_str().unwrap_or("related").to_string();
                match (other, num(id).and_then(|id| self.task_mut(id))) {
                    (Some(other), Some(task)) => {
                        let entry = &mut task["related_tasks"][kind.as_str()];
                        if !entry.is_array() {
                            *entry = json!([]);
                        }
                        if let Some(list) = entry.as_array_mut() {
                            list.push(other);
                        }
                        (StatusCode::CREATED, body.clone())
                    }
                    _ => not_found,
                }
            }

            ("GET", ["labels"]) => (StatusCode::OK, Value::Array(self.labels.clone())),
            ("PUT", ["labels"]) => {
                let id = self.id();
                let mut label = json!({"id": id, "title": "", "hex_color": ""});
                merge(&mut label, body);
                self.labels.push(label.clone());
                (StatusCode::CREATED, label)
            }
            ("DELETE", ["labels", id]) => {
                let id = num(id);
                self.labels.retain(|l| l["id"].as_i64() != id);
                (StatusCode::NO_CONTENT, Value::Null)
            }

            ("GET", ["projects", id, "views"]) => {
                let id = num(id);
                let views: Vec<Value> = self
                    .views
                    .iter()
                    .filter(|v| v["project_id"].as_i64() == id)
                    .cloned()
                    .collect();
                (StatusCode::OK, Value::Array(views))
            }
            ("GET", ["projects", _, "views", view_id, "buckets"]) => {
                let view_id = num(view_id);
                let buckets: Vec<Value> = self
                    .buckets
                    .iter()
                    .filter(|b| b["project_view_id"].as_i64() == view_id)
                    .cloned()
                    .collect();
                (StatusCode::OK, Value::Array(buckets))
            }
            ("PUT", ["projects", _, "views", view_id, "buckets"]) => {
                let id = self.id();
                let mut bucket = json!({
                    "id": id,
                    "title": "",
                    "project_view_id": num(view_id),
                    "limit": 0,
                    "position": 0.0,
                    "tasks": null,
                });
                merge(&mut bucket, body);
                self.buckets.push(bucket.clone());
                (StatusCode::CREATED, bucket)
            }
            ("POST", ["projects", _, "views", _, "buckets", bucket_id, "tasks"]) => {
                let bucket_id = num(bucket_id);
                match body["task_id"].as_i64().and_then(|id| self.task_mut(id)) {
                    Some(task) => {
                        task["bucket_id"] = json!(bucket_id);
                        (StatusCode::OK, body.clone())
                    }
                    None => not_found,
                }
            }

            _ => not_found,
        }
    }
}

fn ok(value: Value) -> (StatusCode, Value) {
    (StatusCode::OK, value)
}

fn find(items: &[Value], id: Option<i64>) -> Option<Value> {
    let id = id?;
    items.iter().find(|v| v["id"].as_i64() == Some(id)).cloned()
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut state = state.lock().unwrap();

    let path = uri.path().to_string();
    state.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        body: (!body.is_null()).then(|| body.clone()),
    });

    let expected = format!("Bearer {}", state.token);
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 11, "message": "missing, malformed, expired or otherwise invalid token provided"})),
        )
            .into_response();
    }
    if state.failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let Some(rest) = path.strip_prefix("/api/v1/") else {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))).into_response();
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    let (status, value) = state.handle(&method, &segments, &body);
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    (status, Json(value)).into_response()
}

/// A running fake Vikunja instance bound to a random local port.
#[derive(Clone)]
pub struct FakeVikunja {
    pub url: String,
    pub token: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeVikunja {
    pub async fn spawn(token: &str) -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            token: token.to_string(),
            ..Default::default()
        }));
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            token: token.to_string(),
            state,
        }
    }

    pub fn add_project(&self, title: &str) -> i64 {
        let project = self.state.lock().unwrap().create_project(&json!({"title": title}));
        project["id"].as_i64().unwrap()
    }

    pub fn add_child_project(&self, title: &str, parent: i64) -> i64 {
        let project = self
            .state
            .lock()
            .unwrap()
            .create_project(&json!({"title": title, "parent_project_id": parent}));
        project["id"].as_i64().unwrap()
    }

    /// Add a task; `fields` is merged over the defaults.
    pub fn add_task(&self, project_id: i64, fields: Value) -> i64 {
        let task = self.state.lock().unwrap().create_task(project_id, &fields);
        task["id"].as_i64().unwrap()
    }

    pub fn add_label(&self, title: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state
            .labels
            .push(json!({"id": id, "title": title, "hex_color": "e8e8e8"}));
        id
    }

    pub fn add_bucket(&self, view_id: i64, title: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.buckets.push(json!({
            "id": id,
            "title": title,
            "project_view_id": view_id,
            "limit": 0,
            "position": 0.0,
            "tasks": null,
        }));
        id
    }

    pub fn kanban_view(&self, project_id: i64) -> i64 {
        self.state
            .lock()
            .unwrap()
            .views
            .iter()
            .find(|v| v["project_id"].as_i64() == Some(project_id) && v["view_kind"] == "kanban")
            .and_then(|v| v["id"].as_i64())
            .unwrap()
    }

    /// Remove all views of a project, leaving it without a kanban board.
    pub fn drop_views(&self, project_id: i64) {
        self.state
            .lock()
            .unwrap()
            .views
            .retain(|v| v["project_id"].as_i64() != Some(project_id));
    }

    pub fn task(&self, id: i64) -> Value {
        find(&self.state.lock().unwrap().tasks, Some(id)).unwrap()
    }

    pub fn tasks(&self) -> Vec<Value> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn projects(&self) -> Vec<Value> {
        self.state.lock().unwrap().projects.clone()
    }

    pub fn labels(&self) -> Vec<Value> {
        self.state.lock().unwrap().labels.clone()
    }

    pub fn buckets(&self) -> Vec<Value> {
        self.state.lock().unwrap().buckets.clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    /// Make every authenticated request fail with a 500.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn entry(&self) -> InstanceEntry {
        InstanceEntry::new(self.url.clone(), self.token.clone())
    }
}

/// Write a config file listing `instances` and build a client over it.
pub fn client_for(
    dir: &TempDir,
    instances: &[(&str, &FakeVikunja)],
) -> VikunjaClient<MapEnv> {
    client_with_config(dir, config_for(instances), MapEnv::default())
}

pub fn config_for(instances: &[(&str, &FakeVikunja)]) -> ConfigFile {
    let mut config = ConfigFile::default();
    for (name, fake) in instances {
        config.instances.insert(name.to_string(), fake.entry());
    }
    config
}

pub fn client_with_config(dir: &TempDir, config: ConfigFile, env: MapEnv) -> VikunjaClient<MapEnv> {
    let store = ConfigStore::new(dir.path().join("config.yaml"));
    store.save(&config).unwrap();
    VikunjaClient::new(Arc::new(InstanceResolver::new(store, env)))
}

/// Build an MCP server over fake instances.
pub fn server_for(
    dir: &TempDir,
    instances: &[(&str, &FakeVikunja)],
) -> VikunjaMcpServer<MapEnv> {
    VikunjaMcpServer::new(client_for(dir, instances))
}

/// Parse the JSON text content of a tool result.
pub fn result_json(result: &CallToolResult) -> Value {
    match &result.content[0].raw {
        RawContent::Text(text) => serde_json::from_str(&text.text).unwrap(),
        _ => panic!("Expected text content"),
    }
}

pub fn is_error(result: &CallToolResult) -> bool {
    result.is_error == Some(true)
}
