/// In-memory implementation of ObjectStore
///
/// Same refuse-on-conflict contract as the real storage service, for tests
/// and local development.
use crate::modules::storage::object_store::{ObjectPath, ObjectStore};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

pub struct InMemoryObjectStore {
    objects: DashMap<String, StoredObject>,
    base_url: String,
    bucket: String,
}

impl InMemoryObjectStore {
    pub fn new(base_url: &str, bucket: &str) -> Self {
        Self {
            objects: DashMap::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn get(&self, path: &ObjectPath) -> Option<StoredObject> {
        self.objects.get(path.as_str()).map(|o| o.clone())
    }

    pub fn contains(&self, path: &ObjectPath) -> bool {
        self.objects.contains_key(path.as_str())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, path: &ObjectPath, bytes: Bytes, content_type: &str) -> AppResult<()> {
        match self.objects.entry(path.as_str().to_string()) {
            Entry::Occupied(_) => Err(AppError::Duplicate(format!(
                "Object {} already exists",
                path
            ))),
            Entry::Vacant(slot) => {
                slot.insert(StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn delete(&self, path: &ObjectPath) -> AppResult<()> {
        self.objects.remove(path.as_str());
        Ok(())
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.as_str()
        )
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
