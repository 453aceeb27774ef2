/// Client-facing upload facade: put the raw object, create the task record,
/// register the local view entry.
use crate::modules::records::domain::entities::NewTaskRecord;
use crate::modules::records::domain::store::TaskRecordStore;
use crate::modules::storage::{ObjectPath, ObjectStore};
use crate::modules::uploads::tracker::{UploadTracker, UploadView};
use crate::shared::errors::{AppError, AppResult};
use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

use crate::{log_info, log_warn};

pub struct Uploader {
    storage: Arc<dyn ObjectStore>,
    records: Arc<dyn TaskRecordStore>,
    tracker: Arc<UploadTracker>,
}

impl Uploader {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        records: Arc<dyn TaskRecordStore>,
        tracker: Arc<UploadTracker>,
    ) -> Self {
        Self {
            storage,
            records,
            tracker,
        }
    }

    /// Upload raw bytes under a fresh task id and queue a task record for
    /// them. The storage insert event takes it from there; this call does
    /// not wait for processing.
    pub async fn upload(&self, file_name: &str, bytes: Bytes) -> AppResult<UploadView> {
        let upload_id = Uuid::new_v4();
        let raw_path = ObjectPath::raw(&upload_id.to_string());

        self.storage
            .upload(&raw_path, bytes, content_type_for_file_name(file_name))
            .await?;

        let original_url = self.storage.public_url(&raw_path);
        let record = self
            .records
            .insert(NewTaskRecord::for_url(&original_url))
            .await?;

        let view = UploadView {
            id: upload_id,
            file_name: file_name.to_string(),
            original_url,
            status: record.status,
            processed_url: None,
            created_at: record.created_at,
        };
        self.tracker.register(view.clone()).await;

        log_info!("Uploaded {} as task {}", file_name, upload_id);
        Ok(view)
    }

    /// Best-effort removal of an upload's objects plus its view entry. The
    /// task record itself is never deleted here.
    pub async fn delete(&self, upload_id: Uuid) -> AppResult<()> {
        if self.tracker.get(upload_id).await.is_none() {
            return Err(AppError::NotFound(format!("No upload {}", upload_id)));
        }

        let task_id = upload_id.to_string();
        let paths = [ObjectPath::raw(&task_id), ObjectPath::processed(&task_id)];
        let results =
            futures::future::join_all(paths.iter().map(|path| self.storage.delete(path))).await;
        for (path, result) in paths.iter().zip(results) {
            if let Err(e) = result {
                log_warn!("Could not delete object {}: {}", path, e);
            }
        }

        self.tracker.remove(upload_id).await;
        log_info!("Removed upload {}", upload_id);
        Ok(())
    }
}

fn content_type_for_file_name(name: &str) -> &'static str {
    match name.rsplit_once('.') {
        Some((_, ext)) => match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        },
        None => "application/octet-stream",
    }
}
