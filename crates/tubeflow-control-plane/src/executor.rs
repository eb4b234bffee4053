//! Task executor seam and the built-in simulated executor.
//!
//! The control plane never knows what a task actually does. It hands the
//! task id, kind and params to a [`TaskExecutor`] and awaits a
//! [`TaskResult`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use tubeflow_core::{RunParams, TaskId, TaskKind, TaskResult};

/// Detail reported when a provided URL cannot be used.
pub const INVALID_SOURCE: &str = "invalid source";

/// Capability that performs the work of a task kind.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Run the task to completion.
    async fn execute(&self, task_id: &TaskId, kind: TaskKind, params: &RunParams) -> TaskResult;
}

/// Executor that simulates platform work with a fixed delay.
///
/// Provided URLs must be absolute `http`/`https` URLs; anything else fails
/// with [`INVALID_SOURCE`].
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    delay: Duration,
}

impl SimulatedExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

fn is_usable_source(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

fn success_detail(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::BulkMetadata => "Titles, descriptions, and tags updated",
        TaskKind::Thumbnail => "Thumbnail rendered from template",
        TaskKind::UploadScheduler => "Upload scheduled for the next optimal slot",
        TaskKind::Analytics => "Performance report generated",
        TaskKind::Download => "Video downloaded",
    }
}

#[async_trait]
impl TaskExecutor for SimulatedExecutor {
    async fn execute(&self, task_id: &TaskId, kind: TaskKind, params: &RunParams) -> TaskResult {
        debug!(task_id = %task_id, kind = ?kind, delay_ms = self.delay.as_millis() as u64, "Simulating task");
        tokio::time::sleep(self.delay).await;

        if let Some(raw) = params.url() {
            if !is_usable_source(raw) {
                info!(task_id = %task_id, url = %raw, "Rejecting unusable source URL");
                return TaskResult::failed(INVALID_SOURCE);
            }
        }

        TaskResult::ok(success_detail(kind))
    }
}
