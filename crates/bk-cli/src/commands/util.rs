//! Shared utilities for CLI commands.

use chrono::NaiveDateTime;

/// Formats a timestamp for display: `2025-03-10 10:00`.
pub fn display_time(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

/// Formats a window for display: `2025-03-10 10:00 -> 2025-03-10 11:00`.
pub fn display_window(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!("{} -> {}", display_time(start), display_time(end))
}
