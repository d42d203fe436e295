use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::models::User;
use crate::instances::{Credentials, Environment, InstanceResolver};

/// Timeout for validating a token before an instance is stored.
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Position step Vikunja uses between tasks in a view.
const POSITION_STEP: f64 = 65536.0;

/// Install the ring crypto provider for rustls. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Build the full API URL for `path` on an instance base URL.
pub fn api_url(base_url: &str, path: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base_url}/api/v1{path}")
    } else {
        format!("{base_url}/api/v1/{path}")
    }
}

/// Placing a task in a kanban bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketAssignment {
    pub project_id: i64,
    pub view_id: i64,
    pub bucket_id: i64,
    pub task_id: i64,
    /// Position within the view; derived from the task id when `None`.
    pub position: Option<f64>,
}

/// Authenticated client for one or more Vikunja instances.
///
/// Each call resolves the target instance through the [`InstanceResolver`],
/// so switching instances takes effect on the next request.
pub struct VikunjaClient<E> {
    resolver: Arc<InstanceResolver<E>>,
    http: Client,
}

impl<E> Clone for VikunjaClient<E> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            http: self.http.clone(),
        }
    }
}

impl<E: Environment> VikunjaClient<E> {
    pub fn new(resolver: Arc<InstanceResolver<E>>) -> Self {
        install_crypto_provider();
        Self {
            resolver,
            http: Client::new(),
        }
    }

    pub fn resolver(&self) -> &InstanceResolver<E> {
        &self.resolver
    }

    /// Send a request to `instance` (current instance when `None` or empty)
    /// and return the parsed JSON body.
    ///
    /// A 204 response yields an empty object.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        instance: Option<&str>,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let creds = self.resolver.credentials(instance)?;
        self.send(&creds, method, path, body).await
    }

    async fn send(
        &self,
        creds: &Credentials,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let url = api_url(&creds.url, path);
        debug!("{} {} [{}]", method, url, creds.name);

        let mut builder = self.http.request(method, &url).bearer_auth(&creds.token);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        Self::handle_response(response).await
    }

    /// Map a response to its JSON body, or to [`ApiError::Http`] on status
    /// 400 and above. The error message prefers the body's `message` field.
    async fn handle_response(response: Response) -> ApiResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if status.as_u16() >= 400 {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(json!({}));
        }

        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, instance: Option<&str>) -> ApiResult<T> {
        let value = self.request(Method::GET, path, instance, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<T, B>(&self, path: &str, instance: Option<&str>, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        let value = self.request(Method::PUT, path, instance, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<T, B>(&self, path: &str, instance: Option<&str>, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        let value = self.request(Method::POST, path, instance, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, path: &str, instance: Option<&str>) -> ApiResult<Value> {
        self.request(Method::DELETE, path, instance, None).await
    }

    /// Move a task into a kanban bucket.
    ///
    /// Vikunja needs two calls for this: one adds the task to the bucket, the
    /// second commits the task's position in the view. Both go to the same
    /// instance.
    pub async fn assign_to_bucket(
        &self,
        instance: Option<&str>,
        assignment: BucketAssignment,
    ) -> ApiResult<()> {
        let creds = self.resolver.credentials(instance)?;
        let BucketAssignment {
            project_id,
            view_id,
            bucket_id,
            task_id,
            position,
        } = assignment;

        let bucket_body = json!({
            "task_id": task_id,
            "bucket_id": bucket_id,
            "project_view_id": view_id,
            "project_id": project_id,
        });
        self.send(
            &creds,
            Method::POST,
            &format!("/projects/{project_id}/views/{view_id}/buckets/{bucket_id}/tasks"),
            Some(&bucket_body),
        )
        .await?;

        let position_body = json!({
            "task_id": task_id,
            "project_view_id": view_id,
            "position": position.unwrap_or(task_id as f64 * POSITION_STEP),
        });
        self.send(
            &creds,
            Method::POST,
            &format!("/tasks/{task_id}/position"),
            Some(&position_body),
        )
        .await?;

        debug!(
            "Assigned task {} to bucket {} in view {} [{}]",
            task_id, bucket_id, view_id, creds.name
        );
        Ok(())
    }

    /// Check a URL/token pair against `GET /user` before it is stored.
    pub async fn validate_token(&self, url: &str, token: &str) -> ApiResult<User> {
        let response = self
            .http
            .get(api_url(url, "/user"))
            .bearer_auth(token)
            .timeout(VALIDATION_TIMEOUT)
            .send()
            .await?;
        let value = Self::handle_response(response).await?;
        Ok(serde_json::from_value(value)?)
    }
}
