//! Task registry - the authoritative store of task identity and status.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use tubeflow_core::{CoreError, RunId, RunSummary, Task, TaskId, TaskStatus};

/// A status transition, as published to registry subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// Run the transition belongs to.
    pub run_id: Option<RunId>,
    pub at: DateTime<Utc>,
}

struct Inner {
    /// Tasks in registration order.
    tasks: Vec<Task>,
    /// Position of each task in `tasks`.
    index: HashMap<TaskId, usize>,
}

/// Canonical mapping from task id to definition and current status.
///
/// All mutation goes through [`TaskRegistry::transition`], a compare-and-swap
/// under a single write lock, so concurrent callers observe linearizable
/// status changes.
pub struct TaskRegistry {
    inner: RwLock<Inner>,
    events: broadcast::Sender<StatusChange>,
}

impl TaskRegistry {
    /// Build a registry from task definitions.
    ///
    /// `event_buffer` bounds how far a status subscriber may lag before it
    /// skips events; it must be non-zero.
    pub fn from_tasks(tasks: Vec<Task>, event_buffer: usize) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(tasks.len());
        for (pos, task) in tasks.iter().enumerate() {
            if index.insert(task.id.clone(), pos).is_some() {
                return Err(CoreError::invalid_parameter(
                    "id",
                    format!("duplicate task id '{}'", task.id),
                ));
            }
        }

        let (events, _) = broadcast::channel(event_buffer.max(1));

        Ok(Self {
            inner: RwLock::new(Inner { tasks, index }),
            events,
        })
    }

    /// Snapshot of all tasks, in registration order.
    pub async fn list(&self) -> Vec<Task> {
        self.inner.read().await.tasks.clone()
    }

    /// Get a single task.
    pub async fn get(&self, id: &TaskId) -> Result<Task, CoreError> {
        let inner = self.inner.read().await;
        inner
            .index
            .get(id)
            .map(|&pos| inner.tasks[pos].clone())
            .ok_or_else(|| CoreError::NotFound(id.clone()))
    }

    /// Number of registered tasks.
    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    /// Returns true if no task is registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Atomically move `id` from `from` to `to`.
    ///
    /// Fails with `InvalidTransition` if the current status is not `from` or if
    /// `from -> to` is not an edge of the status machine. Entering Running
    /// starts a new run summary; leaving it closes the current one.
    pub async fn transition(
        &self,
        id: &TaskId,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<Task, CoreError> {
        let mut inner = self.inner.write().await;
        let pos = *inner
            .index
            .get(id)
            .ok_or_else(|| CoreError::NotFound(id.clone()))?;
        let task = &mut inner.tasks[pos];

        if task.status != from || !from.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                task_id: id.clone(),
                expected: from,
                actual: task.status,
                to,
            });
        }

        task.status = to;
        if to == TaskStatus::Running {
            task.last_run = Some(RunSummary::start());
        } else if let Some(run) = task.last_run.as_mut() {
            run.finish();
        }

        let change = StatusChange {
            task_id: id.clone(),
            from,
            to,
            run_id: task.last_run.as_ref().map(|r| r.run_id.clone()),
            at: Utc::now(),
        };
        debug!(task_id = %id, from = ?from, to = ?to, "Task status changed");

        // No receivers is fine: nobody is watching.
        let _ = self.events.send(change);

        Ok(task.clone())
    }

    /// Count tasks per status, in `TaskStatus::ALL` order.
    pub async fn count_by_status(&self) -> Vec<(TaskStatus, u64)> {
        let inner = self.inner.read().await;
        TaskStatus::ALL
            .iter()
            .map(|status| {
                let count = inner.tasks.iter().filter(|t| t.status == *status).count();
                (*status, count as u64)
            })
            .collect()
    }

    /// Stream of status changes from now on.
    ///
    /// Dropping the stream unsubscribes. A subscriber that falls more than the
    /// event buffer behind skips the overflowed events.
    pub fn subscribe(&self) -> impl Stream<Item = StatusChange> + Send + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(|item| match item {
            Ok(change) => Some(change),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Status subscriber lagged, events dropped");
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tubeflow_core::catalog;

    fn registry() -> TaskRegistry {
        TaskRegistry::from_tasks(catalog(), 16).unwrap()
    }

    #[tokio::test]
    async fn test_list_keeps_registration_order() {
        let registry = registry();
        let ids: Vec<String> = registry
            .list()
            .await
            .into_iter()
            .map(|t| t.id.into_inner())
            .collect();
        assert_eq!(
            ids,
            vec!["metadata", "thumbnail", "scheduler", "analytics", "download"]
        );
    }

    #[tokio::test]
    async fn test_get_unknown_task() {
        let registry = registry();
        let err = registry.get(&TaskId::new("upload")).await.unwrap_err();
        assert_eq!(err, CoreError::NotFound(TaskId::new("upload")));
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let mut tasks = catalog();
        tasks.push(tasks[0].clone());
        let err = TaskRegistry::from_tasks(tasks, 16).err().unwrap();
        assert_eq!(err.code(), "invalid_parameter");
    }

    #[tokio::test]
    async fn test_transition_cas() {
        let registry = registry();
        let id = TaskId::new("scheduler");

        let task = registry
            .transition(&id, TaskStatus::Idle, TaskStatus::Running)
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.last_run.is_some());

        // Second Idle -> Running loses the race.
        let err = registry
            .transition(&id, TaskStatus::Idle, TaskStatus::Running)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                actual: TaskStatus::Running,
                ..
            }
        ));

        // Running -> Running is not an edge even though `from` matches.
        assert!(registry
            .transition(&id, TaskStatus::Running, TaskStatus::Running)
            .await
            .is_err());

        let task = registry
            .transition(&id, TaskStatus::Running, TaskStatus::Completed)
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.last_run.unwrap().finished_at.is_some());
    }

    #[tokio::test]
    async fn test_illegal_edge_does_not_mutate() {
        let registry = registry();
        let id = TaskId::new("metadata");

        assert!(registry
            .transition(&id, TaskStatus::Idle, TaskStatus::Completed)
            .await
            .is_err());
        assert_eq!(registry.get(&id).await.unwrap().status, TaskStatus::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_start_only_one_wins() {
        let registry = Arc::new(registry());
        let id = TaskId::new("analytics");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .transition(&id, TaskStatus::Idle, TaskStatus::Running)
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes() {
        let registry = registry();
        let id = TaskId::new("thumbnail");
        let mut changes = Box::pin(registry.subscribe());

        registry
            .transition(&id, TaskStatus::Idle, TaskStatus::Running)
            .await
            .unwrap();
        registry
            .transition(&id, TaskStatus::Running, TaskStatus::Error)
            .await
            .unwrap();

        let first = changes.next().await.unwrap();
        assert_eq!((first.from, first.to), (TaskStatus::Idle, TaskStatus::Running));
        let second = changes.next().await.unwrap();
        assert_eq!((second.from, second.to), (TaskStatus::Running, TaskStatus::Error));
        assert_eq!(first.run_id, second.run_id);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let registry = registry();
        let id = TaskId::new("download");
        registry
            .transition(&id, TaskStatus::Idle, TaskStatus::Running)
            .await
            .unwrap();
        registry
            .transition(&id, TaskStatus::Running, TaskStatus::Error)
            .await
            .unwrap();

        let snapshot = registry.list().await;
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: Vec<Task> = serde_json::from_str(&json).unwrap();
        let restored = TaskRegistry::from_tasks(decoded, 16).unwrap();

        assert_eq!(restored.list().await, snapshot);
        assert_eq!(restored.get(&id).await.unwrap().status, TaskStatus::Error);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let registry = registry();
        registry
            .transition(&TaskId::new("metadata"), TaskStatus::Idle, TaskStatus::Running)
            .await
            .unwrap();

        let counts = registry.count_by_status().await;
        assert_eq!(counts[0], (TaskStatus::Idle, 4));
        assert_eq!(counts[1], (TaskStatus::Running, 1));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_recovers_with_list() {
        let registry = TaskRegistry::from_tasks(catalog(), 2).unwrap();
        let mut changes = Box::pin(registry.subscribe());

        for id in ["metadata", "thumbnail", "scheduler", "analytics"] {
            registry
                .transition(&TaskId::new(id), TaskStatus::Idle, TaskStatus::Running)
                .await
                .unwrap();
        }

        // The two oldest changes overflowed the buffer.
        let first = changes.next().await.unwrap();
        assert_eq!(first.task_id, TaskId::new("scheduler"));
        assert_eq!(changes.next().await.unwrap().task_id, TaskId::new("analytics"));

        let running: Vec<String> = registry
            .list()
            .await
            .into_iter()
            .filter(|t| t.status == TaskStatus::Running)
            .map(|t| t.id.into_inner())
            .collect();
        assert_eq!(running, vec!["metadata", "thumbnail", "scheduler", "analytics"]);

        registry
            .transition(&TaskId::new("metadata"), TaskStatus::Running, TaskStatus::Completed)
            .await
            .unwrap();
        let next = changes.next().await.unwrap();
        assert_eq!(next.task_id, TaskId::new("metadata"));
        assert_eq!(next.to, TaskStatus::Completed);
    }
}
