/// Domain entities for processing-task records
///
/// A task record tracks one uploaded image through the background-removal
/// pipeline. The row is created by the uploading client and advanced by the
/// task runner; observers mirror it into their local view.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task status enum matching database type
#[derive(
    diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::TaskStatus"]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Ongoing,
    Successful,
    Failed,
}

impl TaskStatus {
    /// Terminal statuses never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Successful | TaskStatus::Failed)
    }

    /// Forward-only transition table. Queued may finalize directly when the
    /// ongoing write was lost (the runner treats that write as best-effort).
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Queued => matches!(
                next,
                TaskStatus::Ongoing | TaskStatus::Successful | TaskStatus::Failed
            ),
            TaskStatus::Ongoing => matches!(next, TaskStatus::Successful | TaskStatus::Failed),
            TaskStatus::Successful | TaskStatus::Failed => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Ongoing => write!(f, "ongoing"),
            TaskStatus::Successful => write!(f, "successful"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(TaskStatus::Queued),
            "ongoing" => Ok(TaskStatus::Ongoing),
            "successful" => Ok(TaskStatus::Successful),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// Task record as stored (row of `file_processing`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub original_image_url: String,
    pub status: TaskStatus,
    pub processed_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New task record before insertion. `id` is normally left to the store;
/// callers that want to share an id with their own bookkeeping may supply one.
#[derive(Debug, Clone)]
pub struct NewTaskRecord {
    pub id: Option<Uuid>,
    pub original_image_url: String,
}

impl NewTaskRecord {
    pub fn for_url(original_image_url: impl Into<String>) -> Self {
        Self {
            id: None,
            original_image_url: original_image_url.into(),
        }
    }
}

/// What happened to a record, broadcast to subscribers after each durable
/// write. Delivery is lossy: a slow subscriber misses changes instead of
/// seeing them replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecordChange {
    pub kind: ChangeKind,
    pub record: TaskRecord,
}
