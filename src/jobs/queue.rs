//! In-process queue feeding cleanup tasks to a single worker.
//!
//! Enqueueing never blocks: when the queue is full the task is dropped with a
//! warning. The worker runs tasks one at a time and, once cancelled, finishes
//! whatever is already queued before exiting.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::DatasetCleanupJob;
use crate::{models::CleanDatasetTask, observability::metrics};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Cleanup queue is closed")]
    Closed,

    #[error("Malformed cleanup task: {0}")]
    Malformed(String),
}

/// Producer side of the cleanup queue. Cheap to clone.
#[derive(Clone)]
pub struct CleanupQueue {
    sender: mpsc::Sender<CleanDatasetTask>,
    capacity: usize,
    dropped_count: Arc<AtomicU64>,
}

/// Consumer side of the cleanup queue, handed to [`start_worker`].
pub struct CleanupReceiver {
    receiver: mpsc::Receiver<CleanDatasetTask>,
}

impl CleanupQueue {
    /// Create a bounded queue holding at most `capacity` pending tasks.
    pub fn new(capacity: usize) -> (Self, CleanupReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                capacity,
                dropped_count: Arc::new(AtomicU64::new(0)),
            },
            CleanupReceiver { receiver },
        )
    }

    /// Queue a task without waiting.
    ///
    /// A full queue drops the task and still returns `Ok`.
    pub fn enqueue(&self, task: CleanDatasetTask) -> Result<(), QueueError> {
        match self.sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                metrics::record_task_dropped();
                let count = self.dropped_count.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    dataset_id = %task.dataset_id,
                    dropped_count = count + 1,
                    capacity = self.capacity,
                    "Cleanup queue full: dropping task"
                );
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Parse one JSON payload and queue it.
    ///
    /// A payload that does not parse is logged at error level, counted under
    /// `dataset_cleanup_errors_total{kind="malformed_task"}` and rejected with
    /// [`QueueError::Malformed`]; the queue stays usable.
    pub fn enqueue_json(&self, payload: &str) -> Result<(), QueueError> {
        match serde_json::from_str::<CleanDatasetTask>(payload) {
            Ok(task) => self.enqueue(task),
            Err(e) => {
                metrics::record_cleanup_error("malformed_task");
                tracing::error!(
                    error = %e,
                    payload_bytes = payload.len(),
                    "Rejected malformed cleanup task"
                );
                Err(QueueError::Malformed(e.to_string()))
            }
        }
    }

    /// Get the count of tasks dropped due to a full queue.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }
}

/// Start the cleanup worker as a background task.
///
/// Runs until `cancel` fires or every [`CleanupQueue`] handle is dropped.
pub fn start_worker(
    mut queue: CleanupReceiver,
    job: Arc<DatasetCleanupJob>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Dataset cleanup worker started");

        loop {
            let task = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                task = queue.receiver.recv() => task,
            };
            let Some(task) = task else {
                tracing::info!("Cleanup queue closed, worker exiting");
                return;
            };
            // Errors are already logged and counted by the job.
            let _ = job.execute(&task).await;
        }

        // Stop accepting new tasks, then drain what was queued before cancellation.
        queue.receiver.close();
        let mut drained = 0usize;
        while let Some(task) = queue.receiver.recv().await {
            let _ = job.execute(&task).await;
            drained += 1;
        }
        tracing::info!(drained, "Dataset cleanup worker shutting down");
    })
}
