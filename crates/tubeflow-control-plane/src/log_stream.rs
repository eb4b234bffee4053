//! Activity log - an append-only, bounded, strictly ordered entry stream.

use std::collections::VecDeque;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use tubeflow_core::{LogEntry, LogLevel, TaskId};

struct Inner {
    entries: VecDeque<LogEntry>,
    next_sequence: u64,
}

/// Append-only activity log with ring-buffer retention.
///
/// Sequence numbers start at 1 and are assigned under the same lock that
/// stores and publishes the entry, so snapshots and subscribers both observe
/// entries in sequence order with no gaps or reuse.
pub struct LogStream {
    inner: Mutex<Inner>,
    capacity: usize,
    tx: broadcast::Sender<LogEntry>,
}

impl LogStream {
    /// Create a log retaining at most `capacity` entries.
    ///
    /// `stream_buffer` bounds how far a subscriber may lag. Zero values are
    /// treated as one.
    pub fn new(capacity: usize, stream_buffer: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(stream_buffer.max(1));
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                next_sequence: 1,
            }),
            capacity,
            tx,
        }
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a message, returning the stored entry.
    pub async fn append(
        &self,
        task_id: Option<&TaskId>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> LogEntry {
        let mut inner = self.inner.lock().await;

        let entry = LogEntry {
            sequence: inner.next_sequence,
            timestamp: Utc::now(),
            task_id: task_id.cloned(),
            level,
            message: message.into(),
        };
        inner.next_sequence += 1;

        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry.clone());

        // No receivers is fine: nobody is watching.
        let _ = self.tx.send(entry.clone());

        entry
    }

    /// Append an informational entry for a task.
    pub async fn info(&self, task_id: &TaskId, message: impl Into<String>) -> LogEntry {
        self.append(Some(task_id), LogLevel::Info, message).await
    }

    /// Append an error entry for a task.
    pub async fn error(&self, task_id: &TaskId, message: impl Into<String>) -> LogEntry {
        self.append(Some(task_id), LogLevel::Error, message).await
    }

    /// All retained entries, in append order.
    pub async fn snapshot(&self) -> Vec<LogEntry> {
        self.inner.lock().await.entries.iter().cloned().collect()
    }

    /// Retained entries with a sequence greater than `sequence`.
    pub async fn since(&self, sequence: u64) -> Vec<LogEntry> {
        let inner = self.inner.lock().await;
        // Entries are sorted by sequence, so skip the prefix.
        let start = inner.entries.partition_point(|e| e.sequence <= sequence);
        inner.entries.range(start..).cloned().collect()
    }

    /// Number of entries ever appended.
    pub async fn appended_total(&self) -> u64 {
        self.inner.lock().await.next_sequence - 1
    }

    /// Number of retained entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Returns true if nothing is retained.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lazy stream of entries appended from now on.
    ///
    /// The stream never ends while the log lives; dropping it unsubscribes
    /// without affecting other subscribers. Entries overflowed by a slow
    /// subscriber are skipped, the gap is visible in the sequence numbers and
    /// can be recovered with [`LogStream::since`].
    pub fn subscribe(&self) -> impl Stream<Item = LogEntry> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|item| match item {
            Ok(entry) => Some(entry),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Log subscriber lagged, entries dropped");
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_append_assigns_sequence() {
        let log = LogStream::new(10, 10);
        let a = log.append(None, LogLevel::Info, "first").await;
        let b = log.info(&TaskId::new("metadata"), "second").await;

        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
        assert_eq!(b.task_id, Some(TaskId::new("metadata")));
        assert_eq!(log.snapshot().await, vec![a, b]);
    }

    #[tokio::test]
    async fn test_retention_drops_oldest() {
        let log = LogStream::new(3, 10);
        for i in 0..5 {
            log.append(None, LogLevel::Info, format!("entry {}", i)).await;
        }

        let sequences: Vec<u64> = log.snapshot().await.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![3, 4, 5]);
        assert_eq!(log.appended_total().await, 5);

        // Sequence numbers keep counting after eviction.
        let next = log.append(None, LogLevel::Info, "after").await;
        assert_eq!(next.sequence, 6);
    }

    #[tokio::test]
    async fn test_since() {
        let log = LogStream::new(3, 10);
        for i in 0..5 {
            log.append(None, LogLevel::Info, format!("entry {}", i)).await;
        }

        let seqs = |entries: Vec<LogEntry>| entries.iter().map(|e| e.sequence).collect::<Vec<_>>();
        assert_eq!(seqs(log.since(0).await), vec![3, 4, 5]);
        assert_eq!(seqs(log.since(4).await), vec![5]);
        assert!(log.since(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_gap_free() {
        let log = Arc::new(LogStream::new(1000, 1000));

        let mut handles = Vec::new();
        for writer in 0..8 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    log.append(None, LogLevel::Info, format!("{}-{}", writer, i))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let entries = log.snapshot().await;
        assert_eq!(entries.len(), 400);
        let unique: HashSet<u64> = entries.iter().map(|e| e.sequence).collect();
        assert_eq!(unique.len(), 400);
        assert!(entries.windows(2).all(|w| w[1].sequence == w[0].sequence + 1));
    }

    #[tokio::test]
    async fn test_subscribe_sees_new_entries_in_order() {
        let log = LogStream::new(10, 10);
        log.append(None, LogLevel::Info, "before").await;

        let mut stream = Box::pin(log.subscribe());
        log.append(None, LogLevel::Info, "one").await;
        log.append(None, LogLevel::Error, "two").await;

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.message, "one");
        assert_eq!(second.message, "two");
        assert_eq!(second.level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_dropping_subscriber_does_not_affect_others() {
        let log = LogStream::new(10, 10);
        let dropped = log.subscribe();
        let mut kept = Box::pin(log.subscribe());
        drop(dropped);

        log.append(None, LogLevel::Info, "still flowing").await;
        assert_eq!(kept.next().await.unwrap().message, "still flowing");
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_recovers_with_since() {
        let log = LogStream::new(10, 2);
        let mut stream = Box::pin(log.subscribe());

        log.append(None, LogLevel::Info, "seen").await;
        let last_seen = stream.next().await.unwrap().sequence;
        assert_eq!(last_seen, 1);

        for i in 2..=6 {
            log.append(None, LogLevel::Info, format!("entry {}", i)).await;
        }

        // Only the newest two fit the buffer; the rest are skipped.
        let resumed = stream.next().await.unwrap();
        assert_eq!(resumed.sequence, 5);
        assert!(resumed.sequence > last_seen + 1);
        assert_eq!(stream.next().await.unwrap().sequence, 6);

        let missed: Vec<u64> = log
            .since(last_seen)
            .await
            .iter()
            .map(|e| e.sequence)
            .filter(|seq| *seq < resumed.sequence)
            .collect();
        assert_eq!(missed, vec![2, 3, 4]);

        log.append(None, LogLevel::Info, "after the gap").await;
        assert_eq!(stream.next().await.unwrap().message, "after the gap");
    }
}
