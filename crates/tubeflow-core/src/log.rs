//! Activity log entries.

use crate::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    #[default]
    Info,
    Error,
}

/// An immutable, sequence-numbered record of progress.
///
/// Ordering is governed by `sequence`; `timestamp` is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log, starting at 1. Never reused.
    pub sequence: u64,

    /// Wall clock time at append.
    pub timestamp: DateTime<Utc>,

    /// Task that produced the entry, if any.
    #[serde(default)]
    pub task_id: Option<TaskId>,

    #[serde(default)]
    pub level: LogLevel,

    pub message: String,
}

impl LogEntry {
    /// Render as a single activity log line, e.g. `[14:02:11] Starting ...`.
    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}
