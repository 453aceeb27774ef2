pub mod entities;
pub mod store;

pub use entities::{ChangeKind, NewTaskRecord, TaskRecord, TaskRecordChange, TaskStatus};
pub use store::{BeginOutcome, TaskRecordStore};
