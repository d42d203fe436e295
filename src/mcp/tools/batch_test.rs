//! Tests for batch and bulk MCP tools

use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;
use tempfile::TempDir;

use crate::mcp::tools::batch::{
    BatchCreateTasksParams, BatchUpdateTasksParams, BulkRelabelTasksParams,
    BulkSetTaskPositionsParams, TaskUpdate,
};
use crate::mcp::tools::tasks::{NewTask, TaskChanges};
use crate::test_support::{FakeVikunja, is_error, result_json, server_for};

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_create_tasks() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Inbox");
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = result_json(
        &server
            .batch_create_tasks(Parameters(BatchCreateTasksParams {
                project_id: Some(project),
                tasks: vec![new_task("one"), new_task("two")],
                instance: None,
            }))
            .await
            .unwrap(),
    );

    assert_eq!(result["created"].as_array().unwrap().len(), 2);
    assert_eq!(result["failed"], json!([]));
    assert_eq!(fake.tasks().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_create_reports_each_failure() {
    let fake = FakeVikunja::spawn("tk").await;
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = result_json(
        &server
            .batch_create_tasks(Parameters(BatchCreateTasksParams {
                project_id: Some(77),
                tasks: vec![new_task("a"), new_task("b")],
                instance: None,
            }))
            .await
            .unwrap(),
    );

    assert_eq!(result["created"], json!([]));
    let failed = result["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[1]["title"], "b");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_update_continues_past_failures() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Inbox");
    let first = fake.add_task(project, json!({"title": "first"}));
    let second = fake.add_task(project, json!({"title": "second"}));
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let done = TaskChanges {
        done: Some(true),
        ..Default::default()
    };
    let result = result_json(
        &server
            .batch_update_tasks(Parameters(BatchUpdateTasksParams {
                updates: vec![
                    TaskUpdate {
                        task_id: first,
                        changes: done.clone(),
                    },
                    TaskUpdate {
                        task_id: 999,
                        changes: done.clone(),
                    },
                    TaskUpdate {
                        task_id: second,
                        changes: TaskChanges::default(),
                    },
                ],
                instance: None,
            }))
            .await
            .unwrap(),
    );

    assert_eq!(result["updated"], json!([{"id": first, "title": "first"}]));
    let failed = result["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0]["task_id"], 999);
    assert_eq!(failed[1]["error"], "No changes specified");
    assert_eq!(fake.task(first)["done"], true);
    assert_eq!(fake.task(second)["done"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bulk_relabel_tasks() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Inbox");
    let a = fake.add_task(project, json!({"title": "a"}));
    let b = fake.add_task(project, json!({"title": "b"}));
    let keep = fake.add_label("keep");
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = result_json(
        &server
            .bulk_relabel_tasks(Parameters(BulkRelabelTasksParams {
                task_ids: vec![a, 999, b],
                add_label_ids: Some(vec![keep]),
                remove_label_ids: None,
                instance: None,
            }))
            .await
            .unwrap(),
    );

    assert_eq!(result["updated"], json!([a, b]));
    assert_eq!(result["failed"][0]["task_id"], 999);
    assert_eq!(fake.task(b)["labels"][0]["title"], "keep");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bulk_relabel_without_labels_is_recoverable() {
    let fake = FakeVikunja::spawn("tk").await;
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = server
        .bulk_relabel_tasks(Parameters(BulkRelabelTasksParams {
            task_ids: vec![1],
            add_label_ids: Some(vec![]),
            remove_label_ids: None,
            instance: None,
        }))
        .await
        .unwrap();

    assert!(is_error(&result));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bulk_set_task_positions() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Board");
    let view = fake.kanban_view(project);
    let bucket = fake.add_bucket(view, "Done");
    let a = fake.add_task(project, json!({"title": "a"}));
    let b = fake.add_task(project, json!({"title": "b"}));
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = result_json(
        &server
            .bulk_set_task_positions(Parameters(BulkSetTaskPositionsParams {
                project_id: project,
                bucket_id: bucket,
                task_ids: vec![a, b, 999],
                view_id: None,
                instance: None,
            }))
            .await
            .unwrap(),
    );

    assert_eq!(result["moved"], json!([a, b]));
    assert_eq!(result["failed"][0]["task_id"], 999);
    assert_eq!(fake.task(a)["bucket_id"], json!(bucket));
    assert_eq!(fake.task(b)["bucket_id"], json!(bucket));
}
