use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::RateLimiter;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::log_debug;

const REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Opaque image transform: bytes in via URL, bytes out.
///
/// The pipeline never inspects what the transform does; it only needs the
/// result bytes or a failure it can retry.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image_url: &str) -> AppResult<Bytes>;
}

/// remove.bg API client
pub struct RemoveBgClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl RemoveBgClient {
    pub fn new(api_key: &str) -> AppResult<Self> {
        Self::with_base_url(REMOVE_BG_ENDPOINT, api_key)
    }

    /// Point the client at a different endpoint, e.g. a stub in staging
    pub fn with_base_url(base_url: &str, api_key: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("cutout/1.0")
            .build()
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            rate_limiter: Arc::new(RateLimiter::new(1.0)),
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, image_url: &str) -> AppResult<Bytes> {
        self.rate_limiter.wait().await;

        log_debug!("Requesting background removal for {}", image_url);

        // The service fetches the image itself; only the URL crosses the wire
        let form = Form::new()
            .text("image_url", image_url.to_string())
            .text("size", "auto");

        let response = self
            .client
            .post(&self.base_url)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ApiError(format!(
                "Background removal failed with {}: {}",
                status, body
            )));
        }

        Ok(response.bytes().await?)
    }
}
