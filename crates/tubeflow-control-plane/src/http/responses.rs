//! HTTP request and response types.

use serde::{Deserialize, Serialize};

use tubeflow_core::{project, RunSummary, StatusView, Task, TaskKind, TaskStatus};

// ============================================================================
// Task types
// ============================================================================

/// Response for a single task.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: TaskKind,
    pub icon: &'static str,
    pub status: TaskStatus,
    pub display: StatusView,
    pub last_run: Option<RunSummary>,
}

impl TaskResponse {
    pub fn from_domain(task: &Task) -> Self {
        Self {
            id: task.id.as_str().to_string(),
            name: task.name.clone(),
            description: task.description.clone(),
            kind: task.kind,
            icon: task.kind.icon(),
            status: task.status,
            display: project(task.status),
            last_run: task.last_run.clone(),
        }
    }
}

/// Currently selected (last run) task.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub task_id: Option<String>,
}

// ============================================================================
// Run types
// ============================================================================

/// Response body for an accepted run.
#[derive(Debug, Serialize)]
pub struct RunAcceptedResponse {
    pub task_id: String,
    pub run_id: String,
    pub status: TaskStatus,
}

// ============================================================================
// Log types
// ============================================================================

/// Query string for the log endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Only return entries after this sequence number.
    #[serde(default)]
    pub since: Option<u64>,
}

// ============================================================================
// Error types
// ============================================================================

/// Error details.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}
