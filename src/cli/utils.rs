//! Shared utilities for CLI commands

use tabled::{Table, settings::Style};

/// Truncate a string with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Date part of an RFC 3339 timestamp, or "-" when there is none
pub fn format_due(due: Option<&str>) -> String {
    match due {
        Some(d) if !d.is_empty() => d.split('T').next().unwrap_or(d).to_string(),
        _ => "-".to_string(),
    }
}

/// Mask all but the last four characters of a token.
///
/// `${VAR}` references are shown as written since they hold no secret.
pub fn mask_token(token: &str) -> String {
    if token.starts_with("${") {
        return token.to_string();
    }
    let count = token.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}
