/// Webhook dispatch module
///
/// Receives storage change events, filters raw uploads into the configured
/// bucket, and enqueues one processing job per matching event.
pub mod dispatcher;
pub mod events;

pub use dispatcher::{DispatchOutcome, WebhookDispatcher};
pub use events::{parse_storage_event, EventKind, ObjectRecord, StorageChangeEvent};
