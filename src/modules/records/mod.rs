/// Task record module
///
/// One record per uploaded image, advanced queued -> ongoing ->
/// successful|failed by the pipeline and mirrored by observers.
///
/// Architecture:
/// - Domain: Entities, status state machine, store trait
/// - Infrastructure: Diesel-based Postgres store and an in-memory store
pub mod domain;
pub mod infrastructure;

// Re-exports for easy access
pub use domain::{
    entities::{ChangeKind, NewTaskRecord, TaskRecord, TaskRecordChange, TaskStatus},
    store::{BeginOutcome, TaskRecordStore},
};
pub use infrastructure::{InMemoryTaskRecordStore, PgTaskRecordStore};
