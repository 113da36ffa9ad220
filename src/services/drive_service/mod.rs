use crate::api::error::AppError;
use crate::models::{EntryKind, FileEntry};
use crate::services::storage::{ObjectAttrs, ObjectData, ObjectStore, StorageError};
use crate::utils::deadline::run_bounded;
use crate::utils::keys::{child_remainder, classify, entry_name, parent_prefix};
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

pub mod folder;
pub mod search;
pub mod types;
pub mod upload;

pub use types::{ListQuery, SearchQuery};

/// Virtual file tree over a flat object store.
pub struct DriveService {
    storage: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl DriveService {
    pub fn new(storage: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        run_bounded(self.timeout, async {
            self.storage.ping().await.map_err(AppError::from)
        })
        .await
    }

    /// Direct children of `query.prefix`, folders first.
    pub async fn list(&self, query: ListQuery) -> Result<Vec<FileEntry>, AppError> {
        let query = query.normalized();
        run_bounded(self.timeout, self.list_children(&query)).await
    }

    async fn list_children(&self, query: &ListQuery) -> Result<Vec<FileEntry>, AppError> {
        let objects = self.fetch(&query.prefix).await?;

        let mut entries: Vec<FileEntry> = objects
            .iter()
            .filter_map(|attrs| {
                let remainder = child_remainder(&query.prefix, &attrs.key)?;
                Some(shape_entry(attrs, remainder))
            })
            .collect();

        sort_folders_first(&mut entries);
        if let Some(limit) = query.limit.filter(|l| *l > 0) {
            entries.truncate(limit);
        }
        self.fill_content_types(&mut entries).await;
        Ok(entries)
    }

    /// Whole body of one object.
    pub async fn read_file(&self, key: &str) -> Result<ObjectData, AppError> {
        run_bounded(self.timeout, async {
            match self.storage.get_object(key).await {
                Ok(data) => Ok(data),
                Err(StorageError::NotFound(key)) => Err(AppError::NotFound(key)),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Some listings (S3 ListObjectsV2) carry no content types; those are
    /// looked up per file entry. A failed lookup leaves the field empty.
    async fn fill_content_types(&self, entries: &mut [FileEntry]) {
        let lookups = entries
            .iter_mut()
            .filter(|e| e.kind == EntryKind::File && e.content_type.is_empty())
            .map(|entry| async move {
                match self.storage.content_type(&entry.original_key).await {
                    Ok(Some(content_type)) => entry.content_type = content_type,
                    Ok(None) => {}
                    Err(e) => tracing::warn!(
                        "content type lookup for {} failed: {}",
                        entry.original_key,
                        e
                    ),
                }
            });
        futures::future::join_all(lookups).await;
    }

    async fn fetch(&self, prefix: &str) -> Result<Vec<ObjectAttrs>, AppError> {
        self.storage.list_objects(prefix).await.map_err(|e| {
            tracing::error!(
                "Bucket({:?}).list_objects({:?}) failed: {}",
                self.storage.bucket(),
                prefix,
                e
            );
            AppError::from(e)
        })
    }
}

/// Builds the listing entry for one object; `remainder` is the key below the
/// queried scope.
fn shape_entry(attrs: &ObjectAttrs, remainder: &str) -> FileEntry {
    let kind = classify(remainder);
    FileEntry {
        name: entry_name(remainder, kind),
        kind,
        created_at: attrs.created_at,
        prefix: parent_prefix(&attrs.key).to_string(),
        size: attrs.size,
        content_type: attrs.content_type.clone().unwrap_or_default(),
        owner: attrs.owner.clone().unwrap_or_default(),
        original_key: attrs.key.clone(),
    }
}

/// Stable: entries of the same kind keep their listing order.
fn sort_folders_first(entries: &mut [FileEntry]) {
    entries.sort_by_key(|e| Reverse(e.kind));
}
