//! Tests for kanban MCP tools

use reqwest::Method;
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;
use tempfile::TempDir;

use crate::mcp::tools::kanban::{
    CreateBucketParams, ListBucketsParams, MoveTaskToBucketParams, ProjectViewsParams,
    SetTaskPositionParams,
};
use crate::test_support::{FakeVikunja, is_error, result_json, server_for};

fn views(project_id: i64) -> Parameters<ProjectViewsParams> {
    Parameters(ProjectViewsParams {
        project_id,
        instance: None,
    })
}

fn move_to(task_id: i64, project_id: i64, bucket: &str) -> Parameters<MoveTaskToBucketParams> {
    Parameters(MoveTaskToBucketParams {
        task_id,
        project_id,
        bucket: bucket.to_string(),
        instance: None,
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_views_and_kanban_view() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Board");
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let listed = result_json(&server.list_views(views(project)).await.unwrap());
    let kinds: Vec<&str> = listed["views"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["view_kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["list", "kanban"]);

    let kanban = result_json(&server.get_kanban_view(views(project)).await.unwrap());
    assert_eq!(kanban["view_id"], json!(fake.kanban_view(project)));
    assert_eq!(kanban["title"], "Kanban");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_kanban_view_is_recoverable() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Flat");
    fake.drop_views(project);
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = server.get_kanban_view(views(project)).await.unwrap();

    assert!(is_error(&result));
    assert_eq!(result_json(&result)["error"], "No kanban view found");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_and_list_buckets() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Board");
    let view = fake.kanban_view(project);
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let created = result_json(
        &server
            .create_bucket(Parameters(CreateBucketParams {
                project_id: project,
                title: "Doing".to_string(),
                view_id: None,
                limit: Some(3),
                position: Some(0.0),
                instance: None,
            }))
            .await
            .unwrap(),
    );
    assert_eq!(created["title"], "Doing");

    let put = fake
        .requests()
        .into_iter()
        .find(|r| r.method == Method::PUT)
        .unwrap();
    assert_eq!(
        put.path,
        format!("/api/v1/projects/{project}/views/{view}/buckets")
    );
    assert_eq!(put.body.unwrap(), json!({"title": "Doing", "limit": 3}));

    let listed = result_json(
        &server
            .list_buckets(Parameters(ListBucketsParams {
                project_id: project,
                view_id: Some(view),
                instance: None,
            }))
            .await
            .unwrap(),
    );
    assert_eq!(listed["buckets"][0]["title"], "Doing");
    assert_eq!(listed["buckets"][0]["limit"], 3);
    assert_eq!(listed["buckets"][0]["task_count"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_task_position_assigns_bucket() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Board");
    let view = fake.kanban_view(project);
    let bucket = fake.add_bucket(view, "Done");
    let task = fake.add_task(project, json!({"title": "t"}));
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = server
        .set_task_position(Parameters(SetTaskPositionParams {
            task_id: task,
            project_id: project,
            bucket_id: bucket,
            view_id: Some(view),
            position: Some(42.0),
            instance: None,
        }))
        .await
        .unwrap();

    assert_eq!(
        result_json(&result),
        json!({"task_id": task, "bucket_id": bucket, "moved": true})
    );
    assert_eq!(fake.task(task)["bucket_id"], json!(bucket));
    let position = fake
        .requests()
        .into_iter()
        .find(|r| r.path.ends_with("/position"))
        .unwrap();
    assert_eq!(position.body.unwrap()["position"], json!(42.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_move_task_to_bucket_by_name() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Board");
    let view = fake.kanban_view(project);
    fake.add_bucket(view, "To Do");
    let review = fake.add_bucket(view, "🔍 Review");
    let task = fake.add_task(project, json!({"title": "t"}));
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = result_json(
        &server
            .move_task_to_bucket(move_to(task, project, "review"))
            .await
            .unwrap(),
    );

    assert_eq!(result["bucket_id"], json!(review));
    assert_eq!(result["bucket"], "🔍 Review");
    assert_eq!(fake.task(task)["bucket_id"], json!(review));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_move_task_to_ambiguous_bucket_changes_nothing() {
    let fake = FakeVikunja::spawn("tk").await;
    let project = fake.add_project("Board");
    let view = fake.kanban_view(project);
    fake.add_bucket(view, "In Progress");
    fake.add_bucket(view, "In Review");
    let task = fake.add_task(project, json!({"title": "t"}));
    let dir = TempDir::new().unwrap();
    let server = server_for(&dir, &[("main", &fake)]);

    let result = server
        .move_task_to_bucket(move_to(task, project, "in"))
        .await
        .unwrap();

    assert!(is_error(&result));
    assert!(
        result_json(&result)["error"]
            .as_str()
            .unwrap()
            .contains("ambiguous")
    );
    assert_eq!(fake.task(task)["bucket_id"], 0);
    assert!(fake.requests().iter().all(|r| r.method == Method::GET));
}
