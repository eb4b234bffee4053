//! Task status machine and its display projection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an automation Task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task registered, never run.
    #[default]
    Idle,
    /// Task has an in-flight run.
    Running,
    /// Last run completed successfully.
    Completed,
    /// Last run failed or was cancelled.
    Error,
}

impl TaskStatus {
    /// All status values, in declaration order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Idle,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Error,
    ];

    /// Returns true if `self -> to` is an edge of the status machine.
    ///
    /// Settled tasks (Idle, Completed, Error) may start again; a running task
    /// may only settle.
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Idle, Running)
                | (Completed, Running)
                | (Error, Running)
                | (Running, Completed)
                | (Running, Error)
        )
    }

    /// Returns true if the task has no in-flight run.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Lowercase name, as used in metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(project(*self).label)
    }
}

/// Display attributes of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub label: &'static str,
    /// Higher ranks need more attention.
    pub severity_rank: u8,
    /// CSS colour.
    pub color: &'static str,
}

/// Project a status onto its display attributes.
pub fn project(status: TaskStatus) -> StatusView {
    match status {
        TaskStatus::Idle => StatusView {
            label: "Idle",
            severity_rank: 0,
            color: "#6b7280",
        },
        TaskStatus::Completed => StatusView {
            label: "Completed",
            severity_rank: 1,
            color: "#22c55e",
        },
        TaskStatus::Running => StatusView {
            label: "Running",
            severity_rank: 2,
            color: "#3b82f6",
        },
        TaskStatus::Error => StatusView {
            label: "Error",
            severity_rank: 3,
            color: "#ef4444",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_edges() {
        use TaskStatus::*;
        let legal = [
            (Idle, Running),
            (Running, Completed),
            (Running, Error),
            (Completed, Running),
            (Error, Running),
        ];

        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_running_to_running_is_illegal() {
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Running.is_settled());
    }

    #[test]
    fn test_projection_is_distinct_per_status() {
        let views: Vec<StatusView> = TaskStatus::ALL.iter().map(|s| project(*s)).collect();
        for (i, a) in views.iter().enumerate() {
            for b in &views[i + 1..] {
                assert_ne!(a.label, b.label);
                assert_ne!(a.severity_rank, b.severity_rank);
            }
        }
        assert_eq!(project(TaskStatus::Error).severity_rank, 3);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&TaskStatus::Running).unwrap();
        assert_eq!(json, "\"RUNNING\"");
        let back: TaskStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(back, TaskStatus::Completed);
    }
}
