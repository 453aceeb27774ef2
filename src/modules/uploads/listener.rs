/// Bridges the record-change stream into the upload tracker.
///
/// Subscribes once and consumes until cancelled. When the stream lags, the
/// dropped changes are simply gone: there is no replay, and an affected
/// entry keeps its stale status until a later change arrives.
use crate::modules::records::domain::entities::ChangeKind;
use crate::modules::records::domain::entities::TaskRecordChange;
use crate::modules::uploads::tracker::UploadTracker;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{log_info, log_warn};

pub struct ChangeListener {
    tracker: Arc<UploadTracker>,
}

impl ChangeListener {
    pub fn new(tracker: Arc<UploadTracker>) -> Self {
        Self { tracker }
    }

    /// Run until the token is cancelled or the store side goes away. Call
    /// with tokio::spawn.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<TaskRecordChange>,
        cancel: CancellationToken,
    ) {
        log_info!("Record change listener started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log_info!("Record change listener stop requested");
                    break;
                }
                result = receiver.recv() => match result {
                    Ok(change) => {
                        // Inserts come from this client's own uploader; only
                        // row updates carry news
                        if change.kind == ChangeKind::Updated {
                            self.tracker.apply(&change.record).await;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        log_warn!(
                            "Record change stream lagged, {} changes dropped",
                            missed
                        );
                    }
                    Err(RecvError::Closed) => {
                        log_info!("Record change stream closed");
                        break;
                    }
                }
            }
        }

        log_info!("Record change listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::records::domain::entities::{TaskRecord, TaskStatus};
    use crate::modules::uploads::tracker::UploadView;
    use chrono::Utc;
    use uuid::Uuid;

    fn change(kind: ChangeKind, url: &str, status: TaskStatus) -> TaskRecordChange {
        TaskRecordChange {
            kind,
            record: TaskRecord {
                id: Uuid::new_v4(),
                original_image_url: url.to_string(),
                status,
                processed_image_url: None,
                created_at: Utc::now(),
            },
        }
    }

    async fn tracker_with_entry(url: &str) -> Arc<UploadTracker> {
        let tracker = Arc::new(UploadTracker::new());
        tracker
            .register(UploadView {
                id: Uuid::new_v4(),
                file_name: "photo.png".to_string(),
                original_url: url.to_string(),
                status: TaskStatus::Queued,
                processed_url: None,
                created_at: Utc::now(),
            })
            .await;
        tracker
    }

    #[tokio::test]
    async fn survives_a_lagged_stream_and_keeps_applying() {
        let url = "https://stub/images/abc/raw";
        let tracker = tracker_with_entry(url).await;

        let (sender, receiver) = broadcast::channel(2);
        // Overflow the two-slot buffer before the listener gets to run, so
        // its first recv reports the lag.
        for _ in 0..4 {
            let _ = sender.send(change(ChangeKind::Updated, "elsewhere", TaskStatus::Ongoing));
        }
        let _ = sender.send(change(ChangeKind::Updated, url, TaskStatus::Successful));
        drop(sender);

        ChangeListener::new(Arc::clone(&tracker))
            .run(receiver, CancellationToken::new())
            .await;

        let entries = tracker.snapshot().await;
        assert_eq!(entries[0].status, TaskStatus::Successful);
    }

    #[tokio::test]
    async fn insert_changes_do_not_touch_the_view() {
        let url = "https://stub/images/abc/raw";
        let tracker = tracker_with_entry(url).await;

        let (sender, receiver) = broadcast::channel(8);
        let _ = sender.send(change(ChangeKind::Inserted, url, TaskStatus::Ongoing));
        drop(sender);

        ChangeListener::new(Arc::clone(&tracker))
            .run(receiver, CancellationToken::new())
            .await;

        let entries = tracker.snapshot().await;
        assert_eq!(entries[0].status, TaskStatus::Queued);
    }
}
