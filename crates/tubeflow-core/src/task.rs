//! Task definitions and the default task catalog.

use crate::{RunId, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of automation a Task performs.
///
/// This is the task's capability reference: the executor dispatches on it and
/// the presentation layer derives its icon from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    BulkMetadata,
    Thumbnail,
    UploadScheduler,
    Analytics,
    Download,
}

impl TaskKind {
    /// Icon name for dashboards.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::BulkMetadata => "file-text",
            Self::Thumbnail => "video",
            Self::UploadScheduler => "calendar",
            Self::Analytics => "trending-up",
            Self::Download => "download",
        }
    }

    /// Returns true if runs of this kind must carry a video URL.
    pub fn requires_url(&self) -> bool {
        matches!(self, Self::Download)
    }
}

/// A Task is a named, independently runnable automation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,

    /// Human readable name.
    pub name: String,

    /// What the task does.
    pub description: String,

    /// Capability reference.
    pub kind: TaskKind,

    /// Current task status.
    pub status: TaskStatus,

    /// Most recent run, if the task ever ran.
    #[serde(default)]
    pub last_run: Option<RunSummary>,
}

impl Task {
    /// Create a new idle Task.
    pub fn new(
        id: impl Into<TaskId>,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: TaskKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            kind,
            status: TaskStatus::Idle,
            last_run: None,
        }
    }
}

/// Summary of the latest run of a Task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: RunId,

    /// When the run entered Running.
    pub started_at: DateTime<Utc>,

    /// When the run settled, if it has.
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// Start a new run now.
    pub fn start() -> Self {
        Self {
            run_id: RunId::generate(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the run as settled.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// The built-in automation tasks, in display order.
pub fn catalog() -> Vec<Task> {
    vec![
        Task::new(
            "metadata",
            "Bulk Metadata Editor",
            "Update titles, descriptions, and tags for multiple videos",
            TaskKind::BulkMetadata,
        ),
        Task::new(
            "thumbnail",
            "Thumbnail Generator",
            "Create custom thumbnails with templates",
            TaskKind::Thumbnail,
        ),
        Task::new(
            "scheduler",
            "Upload Scheduler",
            "Schedule video uploads for optimal times",
            TaskKind::UploadScheduler,
        ),
        Task::new(
            "analytics",
            "Analytics Reporter",
            "Generate automated performance reports",
            TaskKind::Analytics,
        ),
        Task::new(
            "download",
            "Video Downloader",
            "Download videos for backup or editing",
            TaskKind::Download,
        ),
    ]
}
