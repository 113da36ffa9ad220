use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::storage::{ObjectAttrs, ObjectData, ObjectStore, StorageError};

struct StoredObject {
    bytes: Vec<u8>,
    content_type: Option<String>,
    created_at: DateTime<Utc>,
}

/// Process-local object store. Keys are kept ordered so listings come back in
/// the same order an S3 bucket would return them.
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Stores an object unconditionally, replacing any previous one.
    pub fn insert(&self, key: &str, content_type: Option<&str>, bytes: Vec<u8>) {
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                key.to_string(),
                StoredObject {
                    bytes,
                    content_type: content_type.map(str::to_string),
                    created_at: Utc::now(),
                },
            );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectAttrs>, StorageError> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectAttrs {
                key: key.clone(),
                size: object.bytes.len() as i64,
                content_type: object.content_type.clone(),
                created_at: Some(object.created_at),
                owner: None,
            })
            .collect())
    }

    async fn put_if_absent<'a>(
        &self,
        key: &str,
        content_type: Option<&str>,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64, StorageError> {
        if self.contains(key) {
            return Err(StorageError::PreconditionFailed);
        }

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let size = bytes.len() as u64;

        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        // re-checked under the write lock, a concurrent writer may have won
        if objects.contains_key(key) {
            return Err(StorageError::PreconditionFailed);
        }
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.map(str::to_string),
                created_at: Utc::now(),
            },
        );
        Ok(size)
    }

    async fn get_object(&self, key: &str) -> Result<ObjectData, StorageError> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(ObjectData {
            content_type: object.content_type.clone(),
            bytes: object.bytes.clone(),
        })
    }

    async fn content_type(&self, key: &str) -> Result<Option<String>, StorageError> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        Ok(objects.get(key).and_then(|o| o.content_type.clone()))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
