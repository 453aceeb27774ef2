use crate::modules::pipeline::job::{EnqueuedJob, ProcessImagePayload, TASK_NAME};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::log_debug;

/// Handle for submitting processing jobs.
///
/// Submission is fire-and-forget; the dispatcher gets a receipt, never a
/// processing result. Delivery is at-least-once territory: consumers must
/// tolerate seeing the same task id twice.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn submit(&self, payload: ProcessImagePayload) -> AppResult<EnqueuedJob>;
}

/// A job as it travels through the in-process queue
#[derive(Debug)]
pub struct QueuedJob {
    pub job: EnqueuedJob,
    pub payload: ProcessImagePayload,
}

/// Channel-backed queue feeding the worker in this process
pub struct InProcessJobQueue {
    sender: mpsc::UnboundedSender<QueuedJob>,
}

impl InProcessJobQueue {
    /// Returns the queue handle and the receiving end for the worker
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueuedJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobQueue for InProcessJobQueue {
    async fn submit(&self, payload: ProcessImagePayload) -> AppResult<EnqueuedJob> {
        let job = EnqueuedJob {
            id: Uuid::new_v4(),
            task: TASK_NAME.to_string(),
            tags: vec![payload.file_id.clone()],
        };

        self.sender
            .send(QueuedJob {
                job: job.clone(),
                payload,
            })
            .map_err(|_| {
                AppError::InternalError("Job queue is not accepting work".to_string())
            })?;

        log_debug!("Enqueued {} run {} (tags: {:?})", job.task, job.id, job.tags);
        Ok(job)
    }
}
