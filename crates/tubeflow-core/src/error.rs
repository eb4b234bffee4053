//! Core domain errors.

use thiserror::Error;

use crate::{TaskId, TaskStatus};

/// Core domain errors for Tubeflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Task id is not registered.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// Task already has an in-flight run.
    #[error("Task already running: {0}")]
    AlreadyRunning(TaskId),

    /// Cancel requested for a task with no in-flight run.
    #[error("Task not running: {0}")]
    NotRunning(TaskId),

    /// Run parameters are missing or malformed for the task kind.
    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    /// The task executor reported a failure.
    ///
    /// Runs never return this: a failed run settles as Error with the detail
    /// in the activity log. It names the `executor_failure` wire code for
    /// clients and alternative front ends.
    #[error("Executor failure: {0}")]
    ExecutorFailure(String),

    /// Compare-and-swap transition rejected.
    #[error("Invalid state transition for {task_id}: expected {expected:?}, found {actual:?}, wanted {to:?}")]
    InvalidTransition {
        task_id: TaskId,
        expected: TaskStatus,
        actual: TaskStatus,
        to: TaskStatus,
    },

    /// Unexpected internal inconsistency.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyRunning(_) => "already_running",
            Self::NotRunning(_) => "not_running",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::ExecutorFailure(_) => "executor_failure",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Internal(_) => "internal_error",
        }
    }
}
