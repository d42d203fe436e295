//! Client-side task queries.
//!
//! Every function here is pure: it takes the aggregated open tasks and the
//! current time, and returns rows ready to serialize. Nothing is pushed to
//! the server.

use std::cmp::Reverse;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use crate::client::{AggregatedTask, Task};

/// Priority at or above which a task counts as high priority.
pub const HIGH_PRIORITY: i64 = 3;
/// Priority at or above which a task counts as urgent.
pub const URGENT_PRIORITY: i64 = 4;
/// Default number of tasks returned by [`focus`].
pub const DEFAULT_FOCUS_LIMIT: usize = 10;
/// Default look-ahead for [`upcoming`], in days.
pub const DEFAULT_UPCOMING_DAYS: i64 = 3;

/// Sorts after every real RFC 3339 date.
const NO_DUE_SENTINEL: &str = "9999";

/// One task in a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub priority: i64,
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue: Option<bool>,
    pub project: String,
    pub instance: String,
}

impl TaskRow {
    fn from_task(task: &AggregatedTask) -> Self {
        Self {
            id: task.task.id,
            title: task.task.title.clone(),
            priority: task.task.priority,
            due_date: task.task.due_date.clone(),
            overdue: None,
            project: task.project_title.clone(),
            instance: task.instance.clone(),
        }
    }

    fn with_overdue(mut self, overdue: bool) -> Self {
        self.overdue = Some(overdue);
        self
    }

    fn due_key(&self) -> String {
        self.due_date.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskList {
    pub tasks: Vec<TaskRow>,
    pub count: usize,
}

impl From<Vec<TaskRow>> for TaskList {
    fn from(tasks: Vec<TaskRow>) -> Self {
        Self {
            count: tasks.len(),
            tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusList {
    pub tasks: Vec<TaskRow>,
    pub count: usize,
    /// Matches before `limit` was applied.
    pub total_matching: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
    pub high_priority: usize,
    pub urgent: usize,
    pub unscheduled: usize,
}

/// Parse a task's due date.
///
/// Missing values and the zero date are `None`. Values that are not valid
/// RFC 3339 are logged and also treated as `None`.
pub fn parse_due_date(task: &Task) -> Option<DateTime<Utc>> {
    let raw = task.due()?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(due) => Some(due.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring unparseable due date {:?} on task {}: {}", raw, task.id, e);
            None
        }
    }
}

/// 23:59:59 UTC on the day of `now`.
pub fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(23, 59, 59)
        .map_or(now, |end| end.and_utc())
}

fn end_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(7)
}

/// Tasks whose due date has passed, oldest first.
pub fn overdue(tasks: &[AggregatedTask], now: DateTime<Utc>) -> TaskList {
    let mut rows: Vec<TaskRow> = tasks
        .iter()
        .filter(|t| parse_due_date(&t.task).is_some_and(|due| due < now))
        .map(TaskRow::from_task)
        .collect();
    rows.sort_by_key(TaskRow::due_key);
    rows.into()
}

/// Tasks due by the end of today, overdue ones included and flagged.
pub fn due_today(tasks: &[AggregatedTask], now: DateTime<Utc>) -> TaskList {
    let today_end = end_of_day(now);
    let mut rows: Vec<TaskRow> = tasks
        .iter()
        .filter_map(|t| {
            let due = parse_due_date(&t.task)?;
            (due <= today_end).then(|| TaskRow::from_task(t).with_overdue(due < now))
        })
        .collect();
    rows.sort_by_key(TaskRow::due_key);
    rows.into()
}

/// Tasks due within the next seven days, overdue ones included.
pub fn due_this_week(tasks: &[AggregatedTask], now: DateTime<Utc>) -> TaskList {
    let week_end = end_of_week(now);
    let mut rows: Vec<TaskRow> = tasks
        .iter()
        .filter(|t| parse_due_date(&t.task).is_some_and(|due| due <= week_end))
        .map(TaskRow::from_task)
        .collect();
    rows.sort_by_key(TaskRow::due_key);
    rows.into()
}

fn at_least_priority(tasks: &[AggregatedTask], min: i64) -> TaskList {
    let mut rows: Vec<TaskRow> = tasks
        .iter()
        .filter(|t| t.task.priority >= min)
        .map(TaskRow::from_task)
        .collect();
    rows.sort_by_key(|r| Reverse(r.priority));
    rows.into()
}

pub fn high_priority(tasks: &[AggregatedTask]) -> TaskList {
    at_least_priority(tasks, HIGH_PRIORITY)
}

pub fn urgent(tasks: &[AggregatedTask]) -> TaskList {
    at_least_priority(tasks, URGENT_PRIORITY)
}

/// Tasks that need attention now: overdue or urgent.
///
/// Sorted by priority (highest first), then due date with undated tasks last.
/// `limit == 0` returns every match.
pub fn focus(tasks: &[AggregatedTask], now: DateTime<Utc>, limit: usize) -> FocusList {
    let mut matches: Vec<(TaskRow, &str)> = tasks
        .iter()
        .filter_map(|t| {
            let due = parse_due_date(&t.task);
            let is_overdue = due.is_some_and(|due| due < now);
            let is_urgent = t.task.priority >= URGENT_PRIORITY;
            (is_overdue || is_urgent).then(|| {
                // Unparseable dates sort with the undated tasks.
                let due_key = due
                    .and(t.task.due())
                    .unwrap_or(NO_DUE_SENTINEL);
                (TaskRow::from_task(t).with_overdue(is_overdue), due_key)
            })
        })
        .collect();
    matches.sort_by(|(a, a_due), (b, b_due)| {
        b.priority.cmp(&a.priority).then_with(|| a_due.cmp(b_due))
    });
    let mut rows: Vec<TaskRow> = matches.into_iter().map(|(row, _)| row).collect();

    let total_matching = rows.len();
    if limit > 0 {
        rows.truncate(limit);
    }
    FocusList {
        count: rows.len(),
        tasks: rows,
        total_matching,
    }
}

/// Counts only, computed in one pass.
pub fn summary(tasks: &[AggregatedTask], now: DateTime<Utc>) -> Summary {
    let today_end = end_of_day(now);
    let week_end = end_of_week(now);
    let mut counts = Summary {
        total: tasks.len(),
        ..Default::default()
    };

    for t in tasks {
        match parse_due_date(&t.task) {
            Some(due) => {
                if due < now {
                    counts.overdue += 1;
                }
                if due <= today_end {
                    counts.due_today += 1;
                }
                if due <= week_end {
                    counts.due_this_week += 1;
                }
            }
            None => counts.unscheduled += 1,
        }
        if t.task.priority >= HIGH_PRIORITY {
            counts.high_priority += 1;
        }
        if t.task.priority >= URGENT_PRIORITY {
            counts.urgent += 1;
        }
    }

    counts
}

/// Tasks without a usable due date.
pub fn unscheduled(tasks: &[AggregatedTask]) -> TaskList {
    tasks
        .iter()
        .filter(|t| parse_due_date(&t.task).is_none())
        .map(|t| TaskRow {
            due_date: None,
            ..TaskRow::from_task(t)
        })
        .collect::<Vec<_>>()
        .into()
}

/// Tasks due between now and `days` from now. Overdue tasks are excluded.
pub fn upcoming(tasks: &[AggregatedTask], now: DateTime<Utc>, days: i64) -> TaskList {
    let until = Duration::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let mut rows: Vec<TaskRow> = tasks
        .iter()
        .filter(|t| parse_due_date(&t.task).is_some_and(|due| now <= due && due <= until))
        .map(TaskRow::from_task)
        .collect();
    rows.sort_by_key(TaskRow::due_key);
    rows.into()
}
