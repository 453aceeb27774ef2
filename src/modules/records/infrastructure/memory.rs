/// In-memory implementation of TaskRecordStore
///
/// Backs tests and local development without a database. Keyed by the
/// original image URL (unique per record) with the same conditional-update
/// semantics as the Postgres store.
use crate::modules::records::domain::entities::{
    ChangeKind, NewTaskRecord, TaskRecord, TaskRecordChange, TaskStatus,
};
use crate::modules::records::domain::store::{BeginOutcome, TaskRecordStore};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub struct InMemoryTaskRecordStore {
    records: DashMap<String, TaskRecord>,
    changes: broadcast::Sender<TaskRecordChange>,
}

impl InMemoryTaskRecordStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            records: DashMap::new(),
            changes,
        }
    }

    fn publish(&self, kind: ChangeKind, record: &TaskRecord) {
        // A send error only means nobody is subscribed right now
        let _ = self.changes.send(TaskRecordChange {
            kind,
            record: record.clone(),
        });
    }
}

impl Default for InMemoryTaskRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRecordStore for InMemoryTaskRecordStore {
    async fn insert(&self, new_record: NewTaskRecord) -> AppResult<TaskRecord> {
        let record = TaskRecord {
            id: new_record.id.unwrap_or_else(Uuid::new_v4),
            original_image_url: new_record.original_image_url,
            status: TaskStatus::Queued,
            processed_image_url: None,
            created_at: Utc::now(),
        };

        match self.records.entry(record.original_image_url.clone()) {
            Entry::Occupied(_) => Err(AppError::Duplicate(format!(
                "Task record already exists for {}",
                record.original_image_url
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                self.publish(ChangeKind::Inserted, &record);
                Ok(record)
            }
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<TaskRecord>> {
        Ok(self
            .records
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_original_url(
        &self,
        original_image_url: &str,
    ) -> AppResult<Option<TaskRecord>> {
        Ok(self
            .records
            .get(original_image_url)
            .map(|entry| entry.value().clone()))
    }

    async fn begin_processing(&self, original_image_url: &str) -> AppResult<BeginOutcome> {
        let outcome = match self.records.get_mut(original_image_url) {
            None => return Ok(BeginOutcome::NotFound),
            Some(mut entry) => {
                if entry.status == TaskStatus::Queued {
                    entry.status = TaskStatus::Ongoing;
                    BeginOutcome::Started(entry.clone())
                } else {
                    BeginOutcome::AlreadyStarted(entry.clone())
                }
            }
        };

        if let BeginOutcome::Started(record) = &outcome {
            self.publish(ChangeKind::Updated, record);
        }
        Ok(outcome)
    }

    async fn complete(
        &self,
        original_image_url: &str,
        processed_image_url: &str,
    ) -> AppResult<TaskRecord> {
        let updated = match self.records.get_mut(original_image_url) {
            None => {
                return Err(AppError::NotFound(format!(
                    "No task record for {}",
                    original_image_url
                )))
            }
            Some(mut entry) => {
                if entry.status.is_terminal() {
                    return Err(AppError::InvalidOperation(format!(
                        "Cannot complete task record in terminal status {}",
                        entry.status
                    )));
                }
                entry.status = TaskStatus::Successful;
                entry.processed_image_url = Some(processed_image_url.to_string());
                entry.clone()
            }
        };

        self.publish(ChangeKind::Updated, &updated);
        Ok(updated)
    }

    async fn mark_failed(&self, original_image_url: &str) -> AppResult<TaskRecord> {
        let updated = match self.records.get_mut(original_image_url) {
            None => {
                return Err(AppError::NotFound(format!(
                    "No task record for {}",
                    original_image_url
                )))
            }
            Some(mut entry) => {
                if entry.status.is_terminal() {
                    return Err(AppError::InvalidOperation(format!(
                        "Cannot fail task record in terminal status {}",
                        entry.status
                    )));
                }
                entry.status = TaskStatus::Failed;
                entry.clone()
            }
        };

        self.publish(ChangeKind::Updated, &updated);
        Ok(updated)
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskRecordChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_starts_records_queued() {
        let store = InMemoryTaskRecordStore::new();
        let record = store
            .insert(NewTaskRecord::for_url("https://example.test/images/a/raw"))
            .await
            .unwrap();

        assert_eq!(record.status, TaskStatus::Queued);
        assert!(record.processed_image_url.is_none());

        let found = store
            .find_by_original_url("https://example.test/images/a/raw")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, record.id);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_urls() {
        let store = InMemoryTaskRecordStore::new();
        let url = "https://example.test/images/a/raw";
        store.insert(NewTaskRecord::for_url(url)).await.unwrap();

        let err = store.insert(NewTaskRecord::for_url(url)).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }

    #[tokio::test]
    async fn insert_honors_client_supplied_id() {
        let store = InMemoryTaskRecordStore::new();
        let id = Uuid::new_v4();
        let record = store
            .insert(NewTaskRecord {
                id: Some(id),
                original_image_url: "https://example.test/images/a/raw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(record.id, id);
        assert_eq!(store.get(id).await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn begin_processing_claims_only_once() {
        let store = InMemoryTaskRecordStore::new();
        let url = "https://example.test/images/a/raw";
        store.insert(NewTaskRecord::for_url(url)).await.unwrap();

        let first = store.begin_processing(url).await.unwrap();
        assert!(matches!(first, BeginOutcome::Started(_)));

        let second = store.begin_processing(url).await.unwrap();
        match second {
            BeginOutcome::AlreadyStarted(record) => {
                assert_eq!(record.status, TaskStatus::Ongoing)
            }
            other => panic!("expected AlreadyStarted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn begin_processing_reports_missing_records() {
        let store = InMemoryTaskRecordStore::new();
        let outcome = store
            .begin_processing("https://example.test/images/missing/raw")
            .await
            .unwrap();
        assert!(matches!(outcome, BeginOutcome::NotFound));
    }

    #[tokio::test]
    async fn complete_sets_terminal_status_and_url() {
        let store = InMemoryTaskRecordStore::new();
        let url = "https://example.test/images/a/raw";
        store.insert(NewTaskRecord::for_url(url)).await.unwrap();
        store.begin_processing(url).await.unwrap();

        let done = store
            .complete(url, "https://example.test/images/a/processed")
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Successful);
        assert_eq!(
            done.processed_image_url.as_deref(),
            Some("https://example.test/images/a/processed")
        );

        // Terminal records cannot move again
        let err = store.complete(url, "other").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
        let err = store.mark_failed(url).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn subscribers_see_every_write() {
        let store = InMemoryTaskRecordStore::new();
        let mut rx = store.subscribe();
        let url = "https://example.test/images/a/raw";

        store.insert(NewTaskRecord::for_url(url)).await.unwrap();
        store.begin_processing(url).await.unwrap();
        store
            .complete(url, "https://example.test/images/a/processed")
            .await
            .unwrap();

        let inserted = rx.recv().await.unwrap();
        assert_eq!(inserted.kind, ChangeKind::Inserted);
        assert_eq!(inserted.record.status, TaskStatus::Queued);

        let ongoing = rx.recv().await.unwrap();
        assert_eq!(ongoing.kind, ChangeKind::Updated);
        assert_eq!(ongoing.record.status, TaskStatus::Ongoing);

        let successful = rx.recv().await.unwrap();
        assert_eq!(successful.kind, ChangeKind::Updated);
        assert_eq!(successful.record.status, TaskStatus::Successful);
    }
}
