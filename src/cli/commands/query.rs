use chrono::{DateTime, Utc};
use tabled::builder::Builder;
use tabled::{Table, Tabled};

use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, format_due, truncate_with_ellipsis};
use crate::client::{AggregatedTask, VikunjaClient};
use crate::instances::Environment;
use crate::query::{self, FocusList, Summary, TaskRow};

#[derive(Tabled)]
pub(crate) struct TaskRowDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: i64,
    #[tabled(rename = "Title")]
    pub(crate) title: String,
    #[tabled(rename = "Priority")]
    pub(crate) priority: i64,
    #[tabled(rename = "Due")]
    pub(crate) due: String,
    #[tabled(rename = "Project")]
    pub(crate) project: String,
    #[tabled(rename = "Instance")]
    pub(crate) instance: String,
}

impl From<&TaskRow> for TaskRowDisplay {
    fn from(row: &TaskRow) -> Self {
        let due = format_due(row.due_date.as_deref());
        Self {
            id: row.id,
            title: truncate_with_ellipsis(&row.title, 50),
            priority: row.priority,
            due: if row.overdue == Some(true) {
                format!("{} (overdue)", due)
            } else {
                due
            },
            project: truncate_with_ellipsis(&row.project, 30),
            instance: row.instance.clone(),
        }
    }
}

/// Tasks needing attention now, across instances
pub async fn focus<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
    limit: usize,
    format: &str,
) -> CliResult<String> {
    let tasks = client.all_open_tasks(instance).await?;
    render_focus(&tasks, Utc::now(), limit, format)
}

pub(crate) fn render_focus(
    tasks: &[AggregatedTask],
    now: DateTime<Utc>,
    limit: usize,
    format: &str,
) -> CliResult<String> {
    let list = query::focus(tasks, now, limit);

    match format {
        "json" => Ok(serde_json::to_string_pretty(&list)?),
        _ => Ok(format_focus_table(&list)),
    }
}

pub(crate) fn format_focus_table(list: &FocusList) -> String {
    if list.tasks.is_empty() {
        return "Nothing needs attention right now.".to_string();
    }

    let display: Vec<TaskRowDisplay> = list.tasks.iter().map(|t| t.into()).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);

    if list.total_matching > list.count {
        format!(
            "{}\nShowing {} of {} matching tasks",
            table, list.count, list.total_matching
        )
    } else {
        table.to_string()
    }
}

/// Task counts across instances
pub async fn summary<E: Environment>(
    client: &VikunjaClient<E>,
    instance: Option<&str>,
    format: &str,
) -> CliResult<String> {
    let tasks = client.all_open_tasks(instance).await?;
    render_summary(&tasks, Utc::now(), format)
}

pub(crate) fn render_summary(
    tasks: &[AggregatedTask],
    now: DateTime<Utc>,
    format: &str,
) -> CliResult<String> {
    let summary = query::summary(tasks, now);

    match format {
        "json" => Ok(serde_json::to_string_pretty(&summary)?),
        _ => Ok(format_summary_table(&summary)),
    }
}

pub(crate) fn format_summary_table(summary: &Summary) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Bucket", "Count"]);
    for (label, count) in [
        ("Open", summary.total),
        ("Overdue", summary.overdue),
        ("Due today", summary.due_today),
        ("Due this week", summary.due_this_week),
        ("High priority", summary.high_priority),
        ("Urgent", summary.urgent),
        ("Unscheduled", summary.unscheduled),
    ] {
        builder.push_record([label.to_string(), count.to_string()]);
    }

    let mut table = builder.build();
    apply_table_style(&mut table);
    table.to_string()
}
