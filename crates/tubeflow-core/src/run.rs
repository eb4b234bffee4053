//! Run requests and executor results.

use serde::{Deserialize, Serialize};

use crate::{CoreError, TaskId, TaskKind};

/// Placeholder used in log lines when a run carries no URL.
pub const NO_URL_PROVIDED: &str = "No URL provided";

/// Optional parameters of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Target video URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RunParams {
    /// Params with a video URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// The URL, ignoring blank values.
    pub fn url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// The URL or the "No URL provided" placeholder.
    pub fn url_description(&self) -> &str {
        self.url().unwrap_or(NO_URL_PROVIDED)
    }

    /// Check that the params satisfy what `kind` requires.
    pub fn validate_for(&self, kind: TaskKind) -> Result<(), CoreError> {
        if kind.requires_url() && self.url().is_none() {
            return Err(CoreError::invalid_parameter(
                "url",
                "a video URL is required for this task",
            ));
        }
        Ok(())
    }
}

/// A request to run a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub task_id: TaskId,

    #[serde(default)]
    pub params: RunParams,
}

/// Result reported by a task executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    pub detail: String,
}

impl TaskResult {
    /// A successful result.
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            success: true,
            detail: detail.into(),
        }
    }

    /// A failed result.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
        }
    }
}
