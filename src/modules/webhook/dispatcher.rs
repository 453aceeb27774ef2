/// Turns storage change events into processing jobs.
///
/// Only an INSERT of `{task_id}/raw` into the configured bucket dispatches
/// a job; every other well-formed event is acknowledged and dropped so the
/// storage service does not redeliver it.
use crate::modules::pipeline::job::{EnqueuedJob, ProcessImagePayload};
use crate::modules::pipeline::queue::JobQueue;
use crate::modules::storage::{ObjectPath, ObjectStore};
use crate::modules::webhook::events::{parse_storage_event, EventKind};
use crate::shared::errors::AppError;
use std::sync::Arc;

use crate::{log_debug, log_error, log_info, log_warn};

/// What a webhook delivery came to
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A processing job is on the queue
    Accepted(EnqueuedJob),
    /// Well-formed event with nothing for us in it
    Ignored(&'static str),
    /// Malformed payload; redelivery would fail the same way
    Unprocessable(Vec<String>),
    /// The queue refused the job; the sender should redeliver
    Failed(AppError),
}

pub struct WebhookDispatcher {
    storage: Arc<dyn ObjectStore>,
    queue: Arc<dyn JobQueue>,
}

impl WebhookDispatcher {
    pub fn new(storage: Arc<dyn ObjectStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { storage, queue }
    }

    pub async fn handle(&self, body: &[u8]) -> DispatchOutcome {
        let event = match parse_storage_event(body) {
            Ok(event) => event,
            Err(errors) => {
                log_warn!("Rejected malformed storage event: {:?}", errors);
                return DispatchOutcome::Unprocessable(errors);
            }
        };

        if event.kind != EventKind::Insert {
            log_debug!("Ignoring {} event for {}", event.kind, event.record.name);
            return DispatchOutcome::Ignored("not an object insert");
        }

        if event.record.bucket_id != self.storage.bucket() {
            log_debug!(
                "Ignoring insert into foreign bucket {}",
                event.record.bucket_id
            );
            return DispatchOutcome::Ignored("event is for another bucket");
        }

        let task_id = match ObjectPath::task_id_of_raw(&event.record.name) {
            Some(task_id) => task_id,
            None => {
                log_debug!("Ignoring non-raw object {}", event.record.name);
                return DispatchOutcome::Ignored("not a raw upload");
            }
        };

        let image_url = self.storage.public_url(&ObjectPath::raw(task_id));
        let payload = ProcessImagePayload {
            file_id: task_id.to_string(),
            image_url,
        };

        match self.queue.submit(payload).await {
            Ok(job) => {
                log_info!("Dispatched run {} for task {}", job.id, task_id);
                DispatchOutcome::Accepted(job)
            }
            Err(e) => {
                log_error!("Could not enqueue processing job for {}: {}", task_id, e);
                DispatchOutcome::Failed(e)
            }
        }
    }
}
