/// Object storage module
///
/// One bucket, two objects per task: `{task_id}/raw` from the client,
/// `{task_id}/processed` from the pipeline. Uploads refuse to overwrite.
pub mod memory;
pub mod object_store;
pub mod supabase;

pub use memory::InMemoryObjectStore;
pub use object_store::{ObjectPath, ObjectStore, PROCESSED_SUFFIX, RAW_SUFFIX};
pub use supabase::SupabaseStorageClient;
