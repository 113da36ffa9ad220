use crate::api::error::AppError;
use crate::models::FileEntry;
use crate::utils::deadline::run_bounded;
use crate::utils::keys::parent_prefix;

use super::{DriveService, SearchQuery, shape_entry, sort_folders_first};

impl DriveService {
    /// Every object under the scope whose key contains the keyword.
    /// Plain substring containment, no ranking.
    pub async fn search(&self, query: SearchQuery) -> Result<Vec<FileEntry>, AppError> {
        let query = query.normalized();
        run_bounded(self.timeout, self.search_scope(&query)).await
    }

    async fn search_scope(&self, query: &SearchQuery) -> Result<Vec<FileEntry>, AppError> {
        let objects = self.fetch(&query.in_folder).await?;

        let mut entries: Vec<FileEntry> = objects
            .iter()
            .filter(|attrs| attrs.key != query.in_folder)
            .filter(|attrs| attrs.key.to_lowercase().contains(&query.keyword))
            .map(|attrs| {
                // hits can sit at any depth; shape them by their last segment
                let last_segment = &attrs.key[parent_prefix(&attrs.key).len()..];
                shape_entry(attrs, last_segment)
            })
            .collect();

        sort_folders_first(&mut entries);
        self.fill_content_types(&mut entries).await;
        tracing::debug!(
            "🔎 search {:?} in {:?}: {} hit(s)",
            query.keyword,
            query.in_folder,
            entries.len()
        );
        Ok(entries)
    }
}
