/// Background worker for the image-processing pipeline
///
/// Consumes queued jobs and runs each one on its own tokio task, so jobs for
/// different uploads proceed concurrently with no ordering between them.
/// Call `run` with tokio::spawn; stop it through the cancellation token.
use crate::modules::pipeline::processor::{ImageProcessor, JobOutcome};
use crate::modules::pipeline::queue::QueuedJob;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::{log_error, log_info};

pub struct PipelineWorker {
    processor: Arc<ImageProcessor>,
    job_timeout: Duration,
}

impl PipelineWorker {
    pub fn new(processor: Arc<ImageProcessor>, job_timeout: Duration) -> Self {
        Self {
            processor,
            job_timeout,
        }
    }

    /// Run until the token is cancelled or the queue side is dropped.
    /// In-flight jobs are drained before returning.
    pub async fn run(
        self,
        mut receiver: mpsc::UnboundedReceiver<QueuedJob>,
        cancel: CancellationToken,
    ) {
        log_info!("Pipeline worker started");
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log_info!("Pipeline worker stop requested");
                    break;
                }
                queued = receiver.recv() => {
                    match queued {
                        Some(queued) => self.spawn_job(&mut in_flight, queued),
                        None => {
                            log_info!("Job queue closed, pipeline worker stopping");
                            break;
                        }
                    }
                }
                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(join_err) = finished {
                        log_error!("Processing task panicked: {}", join_err);
                    }
                }
            }
        }

        while let Some(finished) = in_flight.join_next().await {
            if let Err(join_err) = finished {
                log_error!("Processing task panicked: {}", join_err);
            }
        }

        log_info!("Pipeline worker stopped");
    }

    fn spawn_job(&self, in_flight: &mut JoinSet<()>, queued: QueuedJob) {
        let processor = Arc::clone(&self.processor);
        let job_timeout = self.job_timeout;

        in_flight.spawn(async move {
            let QueuedJob { job, payload } = queued;
            log_info!("Processing run {} for task {}", job.id, payload.file_id);

            match timeout(job_timeout, processor.process(&payload)).await {
                Ok(Ok(JobOutcome::Completed)) => {
                    log_info!("Run {} completed for task {}", job.id, payload.file_id);
                }
                Ok(Ok(JobOutcome::Skipped)) => {
                    log_info!(
                        "Run {} skipped for task {} (already claimed)",
                        job.id,
                        payload.file_id
                    );
                }
                Ok(Err(e)) => {
                    log_error!("Run {} failed for task {}: {}", job.id, payload.file_id, e);
                }
                Err(_) => {
                    log_error!(
                        "Run {} for task {} exceeded the {}s ceiling and was abandoned",
                        job.id,
                        payload.file_id,
                        job_timeout.as_secs()
                    );
                }
            }
        });
    }
}
