use crate::modules::storage::object_store::{ObjectPath, ObjectStore};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

use crate::log_debug;

/// Supabase storage API client scoped to one bucket.
///
/// Uploads always send `x-upsert: false`; the storage service answering with
/// a conflict is how the pipeline detects an already-processed task.
pub struct SupabaseStorageClient {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl SupabaseStorageClient {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("cutout/1.0")
            .build()
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn object_endpoint(&self, path: &ObjectPath) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            path.as_str()
        )
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorageClient {
    async fn upload(&self, path: &ObjectPath, bytes: Bytes, content_type: &str) -> AppResult<()> {
        let url = self.object_endpoint(path);
        log_debug!("Uploading {} bytes to {}", bytes.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // The storage service reports an existing object either as a plain
        // 409 or as a 400 whose body names the duplicate
        if status.as_u16() == 409 || (status.as_u16() == 400 && body.contains("Duplicate")) {
            return Err(AppError::Duplicate(format!(
                "Object {} already exists",
                path
            )));
        }

        Err(AppError::StorageError(format!(
            "Upload of {} failed with {}: {}",
            path, status, body
        )))
    }

    async fn delete(&self, path: &ObjectPath) -> AppResult<()> {
        let url = self.object_endpoint(path);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        // Deleting a missing object is a no-op
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::StorageError(format!(
            "Delete of {} failed with {}: {}",
            path, status, body
        )))
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.as_str()
        )
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
