use crate::modules::records::domain::entities::{NewTaskRecord, TaskRecord, TaskRecordChange};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Result of the conditional queued -> ongoing update that opens a
/// processing run
#[derive(Debug, Clone)]
pub enum BeginOutcome {
    /// This caller won the transition and holds the run
    Started(TaskRecord),
    /// The record already left `queued`; a duplicate delivery should stop
    AlreadyStarted(TaskRecord),
    /// No record exists for the URL
    NotFound,
}

/// Store for task records, keyed by id with the original image URL as the
/// cross-system join key. Implementations publish a `TaskRecordChange` after
/// every durable write.
#[async_trait]
pub trait TaskRecordStore: Send + Sync {
    /// Insert a new record with status `queued`. The store generates the id
    /// unless the caller supplied one.
    async fn insert(&self, new_record: NewTaskRecord) -> AppResult<TaskRecord>;

    async fn get(&self, id: Uuid) -> AppResult<Option<TaskRecord>>;

    async fn find_by_original_url(&self, original_image_url: &str)
        -> AppResult<Option<TaskRecord>>;

    /// Atomically move the record from `queued` to `ongoing`. Only one
    /// caller can win this transition per record.
    async fn begin_processing(&self, original_image_url: &str) -> AppResult<BeginOutcome>;

    /// Single finalizing write: status `successful` plus the processed image
    /// URL. Fails if the record is missing or already terminal.
    async fn complete(
        &self,
        original_image_url: &str,
        processed_image_url: &str,
    ) -> AppResult<TaskRecord>;

    /// Move a non-terminal record to `failed`. Fails if the record is
    /// missing or already terminal.
    async fn mark_failed(&self, original_image_url: &str) -> AppResult<TaskRecord>;

    /// Subscribe to record changes. The channel is lossy; a lagging
    /// subscriber misses changes instead of seeing them replayed.
    fn subscribe(&self) -> broadcast::Receiver<TaskRecordChange>;
}
