//! Typed Vikunja records.
//!
//! Only the fields this crate reads are modelled. Everything is optional on
//! the wire, so every field carries a serde default and nullable strings and
//! lists collapse to empty values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::serde_utils::{null_as_default, null_as_empty_string};

/// Due-date value Vikunja sends for "no due date".
pub const ZERO_DATE: &str = "0001-01-01T00:00:00Z";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub hex_color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_project_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_archived: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub hex_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub done: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: i64,
    /// Raw RFC 3339 string; [`ZERO_DATE`] means unset.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bucket_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repeat_after: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repeat_mode: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
    /// Related tasks keyed by relation kind (`subtask`, `blocking`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub related_tasks: IndexMap<String, Vec<Task>>,
}

impl Task {
    /// Due date unless unset or the zero sentinel.
    pub fn due(&self) -> Option<&str> {
        self.due_date
            .as_deref()
            .filter(|d| !d.is_empty() && *d != ZERO_DATE)
    }

    pub fn label_titles(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.title.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: i64,
    /// `list`, `gantt`, `table` or `kanban`.
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub view_kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: f64,
}

impl ProjectView {
    pub fn is_kanban(&self) -> bool {
        self.view_kind == "kanban"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_view_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limit: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_empty_string")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_tolerates_nulls() {
        let task: Task = serde_json::from_value(json!({
            "id": 4,
            "title": "Write report",
            "description": null,
            "labels": null,
            "related_tasks": null,
            "due_date": "0001-01-01T00:00:00Z",
            "priority": null,
        }))
        .unwrap();

        assert_eq!(task.description, "");
        assert!(task.labels.is_empty());
        assert!(task.related_tasks.is_empty());
        assert_eq!(task.priority, 0);
        assert_eq!(task.due(), None);
    }

    #[test]
    fn test_task_due_returns_real_dates() {
        let task = Task {
            due_date: Some("2024-05-01T10:00:00Z".to_string()),
            ..Default::default()
        };
        assert_eq!(task.due(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_related_tasks_keep_kind_order() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "related_tasks": {
                "subtask": [{"id": 2, "title": "child"}],
                "blocking": [{"id": 3, "title": "other"}]
            }
        }))
        .unwrap();

        let kinds: Vec<&str> = task.related_tasks.keys().map(String::as_str).collect();
        assert_eq!(kinds, vec!["subtask", "blocking"]);
        assert_eq!(task.related_tasks["subtask"][0].title, "child");
    }

    #[test]
    fn test_view_kind() {
        let view: ProjectView =
            serde_json::from_value(json!({"id": 9, "title": "Kanban", "view_kind": "kanban"}))
                .unwrap();
        assert!(view.is_kanban());
    }
}
