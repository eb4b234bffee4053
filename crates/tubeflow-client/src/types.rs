//! Wire types returned by the control plane.

use serde::Deserialize;

use tubeflow_core::{RunSummary, TaskKind, TaskStatus};

/// A task as listed by `/v1/tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    #[serde(default)]
    pub last_run: Option<RunSummary>,
}

/// Response to an accepted run request.
#[derive(Debug, Clone, Deserialize)]
pub struct RunAccepted {
    pub task_id: String,
    pub run_id: String,
    pub status: TaskStatus,
}

/// Selected task.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Selection {
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}
