/// Client-side view of uploads in flight
use crate::modules::records::domain::entities::{TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::log_debug;

/// One upload as the client sees it. `id` is the client-generated upload id
/// and shares nothing with the task record's row id; reconciliation goes
/// through `original_url` instead.
#[derive(Debug, Clone, Serialize)]
pub struct UploadView {
    pub id: Uuid,
    pub file_name: String,
    pub original_url: String,
    pub status: TaskStatus,
    pub processed_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registry of upload views, newest first
pub struct UploadTracker {
    entries: RwLock<Vec<UploadView>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, view: UploadView) {
        let mut entries = self.entries.write().await;
        entries.insert(0, view);
    }

    /// Mirror a record change into the matching view entry. Records with no
    /// matching URL belong to somebody else's upload and are dropped.
    pub async fn apply(&self, record: &TaskRecord) {
        let mut entries = self.entries.write().await;
        match entries
            .iter_mut()
            .find(|entry| entry.original_url == record.original_image_url)
        {
            Some(entry) => {
                entry.status = record.status;
                if let Some(url) = &record.processed_image_url {
                    entry.processed_url = Some(url.clone());
                }
            }
            None => {
                log_debug!(
                    "No upload entry for record {} ({}), dropping change",
                    record.id,
                    record.original_image_url
                );
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<UploadView> {
        let entries = self.entries.read().await;
        entries.iter().find(|entry| entry.id == id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<UploadView> {
        self.entries.read().await.clone()
    }

    pub async fn remove(&self, id: Uuid) -> Option<UploadView> {
        let mut entries = self.entries.write().await;
        let index = entries.iter().position(|entry| entry.id == id)?;
        Some(entries.remove(index))
    }
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(url: &str) -> UploadView {
        UploadView {
            id: Uuid::new_v4(),
            file_name: "photo.png".to_string(),
            original_url: url.to_string(),
            status: TaskStatus::Queued,
            processed_url: None,
            created_at: Utc::now(),
        }
    }

    fn record(url: &str, status: TaskStatus, processed: Option<&str>) -> TaskRecord {
        TaskRecord {
            id: Uuid::new_v4(),
            original_image_url: url.to_string(),
            status,
            processed_image_url: processed.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn newest_registration_comes_first() {
        let tracker = UploadTracker::new();
        tracker.register(view("https://x.test/a/raw")).await;
        tracker.register(view("https://x.test/b/raw")).await;

        let snapshot = tracker.snapshot().await;
        assert_eq!(snapshot[0].original_url, "https://x.test/b/raw");
        assert_eq!(snapshot[1].original_url, "https://x.test/a/raw");
    }

    #[tokio::test]
    async fn apply_matches_by_original_url_not_id() {
        let tracker = UploadTracker::new();
        let entry = view("https://x.test/a/raw");
        let entry_id = entry.id;
        tracker.register(entry).await;

        // The record carries a different id; only the URL lines up
        let rec = record(
            "https://x.test/a/raw",
            TaskStatus::Successful,
            Some("https://x.test/a/processed"),
        );
        assert_ne!(rec.id, entry_id);
        tracker.apply(&rec).await;

        let updated = tracker.get(entry_id).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Successful);
        assert_eq!(
            updated.processed_url.as_deref(),
            Some("https://x.test/a/processed")
        );
    }

    #[tokio::test]
    async fn apply_keeps_processed_url_when_record_has_none() {
        let tracker = UploadTracker::new();
        let entry = view("https://x.test/a/raw");
        let entry_id = entry.id;
        tracker.register(entry).await;

        tracker
            .apply(&record("https://x.test/a/raw", TaskStatus::Ongoing, None))
            .await;

        let updated = tracker.get(entry_id).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Ongoing);
        assert!(updated.processed_url.is_none());
    }

    #[tokio::test]
    async fn changes_for_unknown_urls_are_dropped() {
        let tracker = UploadTracker::new();
        let entry = view("https://x.test/a/raw");
        let entry_id = entry.id;
        tracker.register(entry).await;

        tracker
            .apply(&record(
                "https://x.test/other/raw",
                TaskStatus::Successful,
                None,
            ))
            .await;

        let untouched = tracker.get(entry_id).await.unwrap();
        assert_eq!(untouched.status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn remove_returns_the_entry() {
        let tracker = UploadTracker::new();
        let entry = view("https://x.test/a/raw");
        let entry_id = entry.id;
        tracker.register(entry).await;

        assert!(tracker.remove(entry_id).await.is_some());
        assert!(tracker.remove(entry_id).await.is_none());
        assert!(tracker.snapshot().await.is_empty());
    }
}
