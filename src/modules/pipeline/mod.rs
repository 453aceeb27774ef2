/// Image-processing pipeline module
///
/// A queued job runs the full sequence for one upload: background removal,
/// mirror-and-reencode, refuse-on-conflict upload, public URL, one
/// finalizing record write. Failures re-run the whole sequence under the
/// retry policy; nothing is checkpointed between attempts.
///
/// Architecture:
/// - job/queue: payload types and the submission handle
/// - processor: the step sequence and retry handling
/// - worker: job consumption, one tokio task per job, 5-minute ceiling
/// - encode: output-format selection and re-encoding
pub mod encode;
pub mod job;
pub mod processor;
pub mod queue;
pub mod worker;

// Re-exports for easy access
pub use encode::OutputFormat;
pub use job::{EnqueuedJob, ProcessImagePayload, TASK_NAME};
pub use processor::{ImageProcessor, JobOutcome, PipelineConfig};
pub use queue::{InProcessJobQueue, JobQueue, QueuedJob};
pub use worker::PipelineWorker;
