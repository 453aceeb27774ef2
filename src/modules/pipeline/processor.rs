/// Executes one processing job: claim the record, run the step sequence
/// under the retry policy, finalize the record.
use crate::modules::pipeline::encode::{self, OutputFormat};
use crate::modules::pipeline::job::ProcessImagePayload;
use crate::modules::records::domain::store::{BeginOutcome, TaskRecordStore};
use crate::modules::removebg::BackgroundRemover;
use crate::modules::storage::{ObjectPath, ObjectStore};
use crate::shared::errors::AppResult;
use crate::shared::utils::logger::TimedOperation;
use crate::shared::utils::retry::{RetryConfig, RetryUtil};
use std::sync::Arc;
use std::time::Duration;

use crate::{log_info, log_warn};

/// Tuning knobs for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retry: RetryConfig,
    /// Mirror and re-encode the transform output (step 2). When off, the
    /// transform bytes are uploaded as they arrived.
    pub reencode: bool,
    /// Write `failed` after the retry policy gives up. Off by default: the
    /// record then stays at its last written status, which observers see as
    /// a task that never finished.
    pub mark_failed_on_exhaustion: bool,
    /// Hard ceiling for one job, enforced by the worker
    pub job_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            reencode: true,
            mark_failed_on_exhaustion: false,
            job_timeout: Duration::from_secs(300),
        }
    }
}

/// How a job run ended short of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// Another delivery already claimed the record; nothing was done
    Skipped,
}

pub struct ImageProcessor {
    records: Arc<dyn TaskRecordStore>,
    storage: Arc<dyn ObjectStore>,
    remover: Arc<dyn BackgroundRemover>,
    config: PipelineConfig,
}

impl ImageProcessor {
    pub fn new(
        records: Arc<dyn TaskRecordStore>,
        storage: Arc<dyn ObjectStore>,
        remover: Arc<dyn BackgroundRemover>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            records,
            storage,
            remover,
            config,
        }
    }

    pub async fn process(&self, payload: &ProcessImagePayload) -> AppResult<JobOutcome> {
        let timer = TimedOperation::new(&format!("process-image {}", payload.file_id));

        match self.records.begin_processing(&payload.image_url).await {
            Ok(BeginOutcome::Started(_)) => {}
            Ok(BeginOutcome::AlreadyStarted(record)) => {
                log_info!(
                    "Task {} is already {}, skipping duplicate delivery",
                    payload.file_id,
                    record.status
                );
                return Ok(JobOutcome::Skipped);
            }
            Ok(BeginOutcome::NotFound) => {
                log_warn!(
                    "No task record for {}, processing continues without one",
                    payload.file_id
                );
            }
            // A status-write failure must not block processing
            Err(e) => {
                log_warn!("Could not move task {} to ongoing: {}", payload.file_id, e);
            }
        }

        let result = RetryUtil::with_retry(
            || self.run_attempt(payload),
            &self.config.retry,
            &format!("process-image {}", payload.file_id),
        )
        .await;

        match result {
            Ok(()) => {
                timer.finish();
                Ok(JobOutcome::Completed)
            }
            Err(error) => {
                if self.config.mark_failed_on_exhaustion {
                    if let Err(mark_err) = self.records.mark_failed(&payload.image_url).await {
                        log_warn!(
                            "Could not mark task {} as failed: {}",
                            payload.file_id,
                            mark_err
                        );
                    }
                }
                Err(error)
            }
        }
    }

    /// One pass over the whole step sequence. Any failure aborts the pass;
    /// the retry policy re-runs it from the top, so no step result is
    /// carried between attempts.
    async fn run_attempt(&self, payload: &ProcessImagePayload) -> AppResult<()> {
        // Step 1: background removal
        let cut_out = self.remover.remove_background(&payload.image_url).await?;

        // Step 2: mirror and re-encode, format keyed to the uploaded URL
        let format = OutputFormat::from_url(&payload.image_url);
        let (bytes, content_type) = if self.config.reencode {
            (
                encode::mirror_and_encode(&cut_out, format)?,
                format.content_type(),
            )
        } else {
            // Transform output is PNG; pass it through untouched
            (cut_out, OutputFormat::Png.content_type())
        };

        // Step 3: upload; an existing object means this task already
        // finished once, and the conflict fails the attempt
        let processed_path = ObjectPath::processed(&payload.file_id);
        self.storage
            .upload(&processed_path, bytes, content_type)
            .await?;

        // Step 4: public URL, derived without a round trip
        let processed_url = self.storage.public_url(&processed_path);

        // Step 5: the single finalizing write
        self.records
            .complete(&payload.image_url, &processed_url)
            .await?;

        Ok(())
    }
}
