//! Power queries over open tasks from every instance.

mod filters;


pub use filters::{
    DEFAULT_FOCUS_LIMIT, DEFAULT_UPCOMING_DAYS, FocusList, HIGH_PRIORITY, Summary, TaskList,
    TaskRow, URGENT_PRIORITY, due_this_week, due_today, end_of_day, focus, high_priority, overdue,
    parse_due_date, summary, unscheduled, upcoming, urgent,
};
