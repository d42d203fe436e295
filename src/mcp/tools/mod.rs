//! MCP tool implementations
//!
//! Tools are grouped by area. Each module adds one `#[tool_router]` block to
//! [`VikunjaMcpServer`](crate::mcp::VikunjaMcpServer); the server merges them.
//!
//! Failures come in two tiers. Problems the agent can fix (unknown instance,
//! missing configuration, ambiguous bucket name) are returned as an
//! `{"error": ...}` tool result flagged `is_error`. Transport failures and
//! HTTP errors from Vikunja abort the call with an MCP internal error.

pub mod batch;
pub mod instances;
pub mod kanban;
pub mod labels;
pub mod projects;
pub mod queries;
pub mod relations;
pub mod tasks;
pub mod transfer;
pub mod xq;

#[cfg(test)]
mod batch_test;
#[cfg(test)]
mod kanban_test;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::client::{ApiError, Bucket, ProjectView, VikunjaClient};
use crate::instances::{Environment, ResolveError};

/// Length descriptions are cut to in task listings.
pub(crate) const DESCRIPTION_PREVIEW: usize = 200;

#[derive(Debug)]
pub(crate) enum ToolError {
    /// Reported back to the agent as a tool result.
    Recoverable(String),
    /// Aborts the tool call.
    Api(ApiError),
}

impl ToolError {
    pub(crate) fn recoverable(message: impl Into<String>) -> Self {
        ToolError::Recoverable(message.into())
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Recoverable(message) => f.write_str(message),
            ToolError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl From<ApiError> for ToolError {
    fn from(e: ApiError) -> Self {
        if e.is_recoverable() {
            ToolError::Recoverable(e.to_string())
        } else {
            ToolError::Api(e)
        }
    }
}

impl From<ResolveError> for ToolError {
    fn from(e: ResolveError) -> Self {
        ToolError::Recoverable(e.to_string())
    }
}

pub(crate) type ToolResult<T> = Result<T, ToolError>;

/// Serialize `value` as the pretty-printed text content of a successful result.
pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Turn a tool body's outcome into the MCP response.
pub(crate) fn finish<T: Serialize>(result: ToolResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => json_result(&value),
        Err(ToolError::Recoverable(message)) => {
            let text = serde_json::to_string_pretty(&json!({ "error": message }))
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(CallToolResult::error(vec![Content::text(text)]))
        }
        Err(ToolError::Api(e)) => {
            warn!("Tool call failed: {}", e);
            Err(McpError::internal_error(e.to_string(), None))
        }
    }
}

/// `Some` only for a non-empty string.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Expand a date-only value (`2024-05-01`) to a full timestamp. Start and due
/// dates become midnight, end dates 23:59.
pub(crate) fn expand_date(value: &str, end: bool) -> String {
    if value.contains('T') {
        value.to_string()
    } else if end {
        format!("{value}T23:59:00Z")
    } else {
        format!("{value}T00:00:00Z")
    }
}

pub(crate) fn preview(text: &str) -> String {
    text.chars().take(DESCRIPTION_PREVIEW).collect()
}

/// Explicit project id, else the session's default project.
pub(crate) fn project_or_default<E: Environment>(
    client: &VikunjaClient<E>,
    project_id: Option<i64>,
) -> ToolResult<i64> {
    match project_id.filter(|id| *id > 0) {
        Some(id) => Ok(id),
        None => client.resolver().context()?.project_id.ok_or_else(|| {
            ToolError::recoverable(
                "No project_id given and no default project set. Use set_active_context.",
            )
        }),
    }
}

/// First kanban view of a project.
pub(crate) async fn kanban_view<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
    project_id: i64,
) -> ToolResult<ProjectView> {
    let views: Vec<ProjectView> = client
        .get(&format!("/projects/{project_id}/views"), instance)
        .await?;
    views
        .into_iter()
        .find(ProjectView::is_kanban)
        .ok_or_else(|| ToolError::recoverable("No kanban view found"))
}

/// Pick a bucket by title.
///
/// A case-insensitive exact match wins. Otherwise the query must be a
/// substring of exactly one bucket title.
pub(crate) fn match_bucket<'a>(buckets: &'a [Bucket], query: &str) -> ToolResult<&'a Bucket> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(ToolError::recoverable("Bucket name must not be empty"));
    }

    if let Some(bucket) = buckets
        .iter()
        .find(|b| b.title.trim().to_lowercase() == needle)
    {
        return Ok(bucket);
    }

    let partial: Vec<&Bucket> = buckets
        .iter()
        .filter(|b| b.title.to_lowercase().contains(&needle))
        .collect();
    let titles = |list: &[&Bucket]| {
        list.iter()
            .map(|b| b.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    match partial.as_slice() {
        [bucket] => Ok(*bucket),
        [] => {
            let all: Vec<&Bucket> = buckets.iter().collect();
            Err(ToolError::recoverable(format!(
                "No bucket matching '{query}'. Available: {}",
                titles(&all)
            )))
        }
        many => Err(ToolError::recoverable(format!(
            "Bucket name '{query}' is ambiguous. Matches: {}",
            titles(many)
        ))),
    }
}
