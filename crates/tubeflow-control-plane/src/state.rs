//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use tubeflow_core::{catalog, CoreError, Task};

use crate::config::Config;
use crate::executor::TaskExecutor;
use crate::log_stream::LogStream;
use crate::registry::TaskRegistry;
use crate::runner::TaskRunner;

/// Shared application state.
///
/// Built once at process start and handed to the HTTP layer; dropped at
/// shutdown.
pub struct AppState {
    /// Task definitions and status.
    pub registry: Arc<TaskRegistry>,

    /// Activity log.
    pub log: Arc<LogStream>,

    /// Run orchestration.
    pub runner: Arc<TaskRunner>,

    /// When the process started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state for the built-in task catalog.
    pub fn new(config: &Config, executor: Arc<dyn TaskExecutor>) -> Result<Arc<Self>, CoreError> {
        Self::with_tasks(config, catalog(), executor)
    }

    /// Create state for an explicit task list.
    pub fn with_tasks(
        config: &Config,
        tasks: Vec<Task>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<Arc<Self>, CoreError> {
        let registry = Arc::new(TaskRegistry::from_tasks(tasks, config.stream_buffer)?);
        let log = Arc::new(LogStream::new(config.log_capacity, config.stream_buffer));
        let runner = TaskRunner::new(registry.clone(), log.clone(), executor);

        Ok(Arc::new(Self {
            registry,
            log,
            runner,
            started_at: Utc::now(),
        }))
    }
}
