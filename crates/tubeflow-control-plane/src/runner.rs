//! Task runner - drives a task from a run request to a settled status.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tubeflow_core::{CoreError, RunId, RunParams, Task, TaskId, TaskResult, TaskStatus};

use crate::executor::TaskExecutor;
use crate::log_stream::LogStream;
use crate::registry::TaskRegistry;

/// Failure detail recorded when a run is cancelled.
pub const CANCELLED: &str = "cancelled";

/// Failure detail recorded when the executor panics.
pub const EXECUTOR_PANICKED: &str = "executor panicked";

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub task_id: TaskId,
    pub run_id: RunId,
    pub status: TaskStatus,
    pub detail: String,
}

/// Handle to an initiated run.
///
/// Dropping the handle detaches the run; it still settles in the background.
#[derive(Debug)]
pub struct RunHandle {
    pub task_id: TaskId,
    pub run_id: RunId,
    handle: JoinHandle<Result<RunOutcome, CoreError>>,
}

impl RunHandle {
    /// Wait for the run to settle.
    pub async fn wait(self) -> Result<RunOutcome, CoreError> {
        self.handle
            .await
            .map_err(|e| CoreError::Internal(format!("run task failed: {}", e)))?
    }
}

/// Run counters, for metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Orchestrates task execution.
///
/// The runner is the only writer of the activity log and the only caller of
/// [`TaskRegistry::transition`].
pub struct TaskRunner {
    registry: Arc<TaskRegistry>,
    log: Arc<LogStream>,
    executor: Arc<dyn TaskExecutor>,
    /// Cancellation tokens of in-flight runs.
    in_flight: Mutex<HashMap<TaskId, CancellationToken>>,
    /// Last task a run was started for.
    selected: RwLock<Option<TaskId>>,
    counters: Counters,
}

impl TaskRunner {
    /// Create a new TaskRunner wrapped in Arc.
    pub fn new(
        registry: Arc<TaskRegistry>,
        log: Arc<LogStream>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            log,
            executor,
            in_flight: Mutex::new(HashMap::new()),
            selected: RwLock::new(None),
            counters: Counters::default(),
        })
    }

    /// Start a run of `task_id`.
    ///
    /// Returns once the task is Running, its cancellation token is
    /// registered and the "Starting" entry is logged. Precondition failures
    /// (`NotFound`, `InvalidParameter`, `AlreadyRunning`) leave the registry
    /// and the log untouched.
    ///
    /// Nothing is awaited between the move to Running and the spawn of the
    /// run task, so dropping this future never strands a task in Running.
    pub async fn run(
        self: &Arc<Self>,
        task_id: &TaskId,
        params: RunParams,
    ) -> Result<RunHandle, CoreError> {
        let task = self.registry.get(task_id).await?;
        params.validate_for(task.kind)?;

        let started = self.begin(&task).await?;
        let run_id = started
            .last_run
            .as_ref()
            .map(|r| r.run_id.clone())
            .unwrap_or_else(RunId::generate);

        let (ready_tx, ready_rx) = oneshot::channel();
        let runner = Arc::clone(self);
        let handle = {
            let run_id = run_id.clone();
            tokio::spawn(async move { runner.start(started, run_id, params, ready_tx).await })
        };

        if ready_rx.await.is_err() {
            error!(task_id = %task.id, run_id = %run_id, "Run task exited before registering");
            return Err(CoreError::Internal(format!(
                "run of task {} exited before registering",
                task.id
            )));
        }

        Ok(RunHandle {
            task_id: task.id,
            run_id,
            handle,
        })
    }

    /// Register the run, log its start and drive it to a settled status.
    async fn start(
        self: Arc<Self>,
        task: Task,
        run_id: RunId,
        params: RunParams,
        ready: oneshot::Sender<()>,
    ) -> Result<RunOutcome, CoreError> {
        let token = CancellationToken::new();
        self.in_flight
            .lock()
            .await
            .insert(task.id.clone(), token.clone());
        *self.selected.write().await = Some(task.id.clone());
        self.counters.started.fetch_add(1, Ordering::Relaxed);

        self.log
            .info(&task.id, format!("Starting {} task...", task.name))
            .await;
        info!(
            task_id = %task.id,
            run_id = %run_id,
            url = %params.url_description(),
            "Task run started"
        );

        // The caller may have gone away; the run goes on regardless.
        let _ = ready.send(());

        self.drive(task, run_id, params, token).await
    }

    /// Cancel the in-flight run of `task_id`.
    ///
    /// The run settles as Error with a "cancelled" detail. The token stays
    /// registered until the task has left Running, so `NotRunning` is only
    /// returned once the registry reports a settled status. A cancel that
    /// lands after the executor returned has no effect on the outcome.
    pub async fn cancel(&self, task_id: &TaskId) -> Result<(), CoreError> {
        self.registry.get(task_id).await?;

        let token = self.in_flight.lock().await.get(task_id).cloned();
        match token {
            Some(token) => {
                info!(task_id = %task_id, "Cancelling task run");
                token.cancel();
                Ok(())
            }
            None => Err(CoreError::NotRunning(task_id.clone())),
        }
    }

    /// Cancel every in-flight run. Returns how many were cancelled.
    pub async fn cancel_all(&self) -> usize {
        let in_flight = self.in_flight.lock().await;
        for (task_id, token) in in_flight.iter() {
            info!(task_id = %task_id, "Cancelling task run on shutdown");
            token.cancel();
        }
        in_flight.len()
    }

    /// The task of the most recent run, if any.
    pub async fn selected(&self) -> Option<TaskId> {
        self.selected.read().await.clone()
    }

    /// Run counters since start.
    pub fn stats(&self) -> RunStats {
        RunStats {
            started: self.counters.started.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Move a settled task to Running.
    ///
    /// Retries the compare-and-swap while another caller settles the task
    /// concurrently; gives up with `AlreadyRunning` once it observes Running.
    async fn begin(&self, task: &Task) -> Result<Task, CoreError> {
        let mut current = task.status;
        loop {
            if !current.is_settled() {
                warn!(task_id = %task.id, "Rejecting run, task already running");
                return Err(CoreError::AlreadyRunning(task.id.clone()));
            }
            match self
                .registry
                .transition(&task.id, current, TaskStatus::Running)
                .await
            {
                Ok(started) => return Ok(started),
                Err(CoreError::InvalidTransition { actual, .. }) => current = actual,
                Err(e) => return Err(e),
            }
        }
    }

    /// Await the executor (or cancellation) and settle the task.
    async fn drive(
        self: Arc<Self>,
        task: Task,
        run_id: RunId,
        params: RunParams,
        token: CancellationToken,
    ) -> Result<RunOutcome, CoreError> {
        let execution = {
            let executor = Arc::clone(&self.executor);
            let task_id = task.id.clone();
            let kind = task.kind;
            let params = params.clone();
            tokio::spawn(async move { executor.execute(&task_id, kind, &params).await })
        };
        let abort = execution.abort_handle();

        let result = tokio::select! {
            joined = execution => match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(task_id = %task.id, run_id = %run_id, error = %e, "Executor task failed");
                    TaskResult::failed(EXECUTOR_PANICKED)
                }
            },
            _ = token.cancelled() => {
                abort.abort();
                TaskResult::failed(CANCELLED)
            }
        };

        let outcome = self.settle(&task, run_id, &params, result).await;
        self.in_flight.lock().await.remove(&task.id);
        outcome
    }

    /// Record the executor result and move the task out of Running.
    async fn settle(
        &self,
        task: &Task,
        run_id: RunId,
        params: &RunParams,
        result: TaskResult,
    ) -> Result<RunOutcome, CoreError> {
        let to = if result.success {
            let mut message = format!(
                "{} task completed successfully. Video URL: {}.",
                task.name,
                params.url_description()
            );
            if !result.detail.is_empty() {
                message.push(' ');
                message.push_str(&result.detail);
            }
            self.log.info(&task.id, message).await;
            self.counters.completed.fetch_add(1, Ordering::Relaxed);
            TaskStatus::Completed
        } else {
            self.log
                .error(&task.id, format!("{} task failed: {}", task.name, result.detail))
                .await;
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            TaskStatus::Error
        };

        if let Err(e) = self
            .registry
            .transition(&task.id, TaskStatus::Running, to)
            .await
        {
            error!(task_id = %task.id, run_id = %run_id, error = %e, "Failed to settle task");
            return Err(CoreError::Internal(format!(
                "failed to settle task {}: {}",
                task.id, e
            )));
        }

        info!(
            task_id = %task.id,
            run_id = %run_id,
            status = ?to,
            detail = %result.detail,
            "Task run settled"
        );

        Ok(RunOutcome {
            task_id: task.id.clone(),
            run_id,
            status: to,
            detail: result.detail,
        })
    }
}
