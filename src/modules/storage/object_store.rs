use crate::shared::errors::AppResult;
use async_trait::async_trait;
use bytes::Bytes;

pub const RAW_SUFFIX: &str = "/raw";
pub const PROCESSED_SUFFIX: &str = "/processed";

/// Path of an object inside the images bucket.
///
/// The pipeline uses exactly two objects per task: `{task_id}/raw` uploaded
/// by the client and `{task_id}/processed` written by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    name: String,
}

impl ObjectPath {
    pub fn raw(task_id: &str) -> Self {
        Self {
            name: format!("{}{}", task_id, RAW_SUFFIX),
        }
    }

    pub fn processed(task_id: &str) -> Self {
        Self {
            name: format!("{}{}", task_id, PROCESSED_SUFFIX),
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Task id of a raw upload, `None` for any other object name. The id is
    /// not validated further; it is treated as opaque.
    pub fn task_id_of_raw(name: &str) -> Option<&str> {
        name.strip_suffix(RAW_SUFFIX)
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Key-value object store scoped to one bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes to `path`. Refuses to overwrite: an existing object
    /// fails the call with `AppError::Duplicate`.
    async fn upload(&self, path: &ObjectPath, bytes: Bytes, content_type: &str) -> AppResult<()>;

    /// Delete the object if present. Deleting a missing object is not an
    /// error.
    async fn delete(&self, path: &ObjectPath) -> AppResult<()>;

    /// Deterministic public URL for `path`; never performs a round trip.
    fn public_url(&self, path: &ObjectPath) -> String;

    fn bucket(&self) -> &str;
}
