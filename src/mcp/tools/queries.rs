//! Power queries across every configured instance
//!
//! Each call re-fetches all open tasks and filters them locally. A failing
//! instance is left out of the result.

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

use crate::client::AggregatedTask;
use crate::instances::Environment;
use crate::mcp::server::VikunjaMcpServer;
use crate::mcp::tools::{ToolError, ToolResult, finish, non_empty};
use crate::query;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "Only query this instance (default: all)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FocusParams {
    #[schemars(description = "Maximum tasks to return (default: 10, 0: no limit)")]
    pub limit: Option<usize>,
    #[schemars(description = "Only query this instance (default: all)")]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpcomingParams {
    #[schemars(description = "Look-ahead window in days (default: 3)")]
    pub days: Option<i64>,
    #[schemars(description = "Only query this instance (default: all)")]
    pub instance: Option<String>,
}

impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    async fn open_tasks(&self, instance: &Option<String>) -> ToolResult<Vec<AggregatedTask>> {
        Ok(self.client.all_open_tasks(non_empty(instance)).await?)
    }
}

#[tool_router(router = query_router, vis = "pub(crate)")]
impl<E: Environment + Send + Sync + 'static> VikunjaMcpServer<E> {
    #[tool(description = "Open tasks past their due date, oldest first.")]
    pub async fn overdue_tasks(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::overdue(&tasks, Utc::now()))
        }
        .await)
    }

    #[tool(
        description = "Tasks due by the end of today, including overdue ones, earliest due first."
    )]
    pub async fn due_today(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::due_today(&tasks, Utc::now()))
        }
        .await)
    }

    #[tool(description = "Tasks due within the next 7 days, including overdue ones.")]
    pub async fn due_this_week(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::due_this_week(&tasks, Utc::now()))
        }
        .await)
    }

    #[tool(description = "Open tasks with priority 3 or higher.")]
    pub async fn high_priority_tasks(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::high_priority(&tasks))
        }
        .await)
    }

    #[tool(description = "Open tasks with priority 4 or higher.")]
    pub async fn urgent_tasks(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::urgent(&tasks))
        }
        .await)
    }

    #[tool(
        description = "What to work on now: overdue or urgent tasks, highest priority first, then earliest due."
    )]
    pub async fn focus_now(
        &self,
        params: Parameters<FocusParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.0.limit.unwrap_or(query::DEFAULT_FOCUS_LIMIT);
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::focus(&tasks, Utc::now(), limit))
        }
        .await)
    }

    #[tool(description = "Counts of open tasks by urgency. Cheap overview, no task details.")]
    pub async fn task_summary(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::summary(&tasks, Utc::now()))
        }
        .await)
    }

    #[tool(description = "Open tasks without a due date.")]
    pub async fn unscheduled_tasks(
        &self,
        params: Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::unscheduled(&tasks))
        }
        .await)
    }

    #[tool(description = "Tasks coming due in the next few days, soonest first. Excludes overdue.")]
    pub async fn upcoming_deadlines(
        &self,
        params: Parameters<UpcomingParams>,
    ) -> Result<CallToolResult, McpError> {
        let days = params.0.days.unwrap_or(query::DEFAULT_UPCOMING_DAYS);
        finish(async {
            let tasks = self.open_tasks(&params.0.instance).await?;
            Ok::<_, ToolError>(query::upcoming(&tasks, Utc::now(), days))
        }
        .await)
    }
}
