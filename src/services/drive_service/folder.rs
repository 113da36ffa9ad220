use crate::api::error::AppError;
use crate::services::storage::StorageError;
use crate::utils::deadline::run_bounded;
use crate::utils::keys::normalize_folder_name;

use super::DriveService;

/// Content type stamped on zero-byte folder markers.
pub const FOLDER_MARKER_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

impl DriveService {
    /// Writes the zero-byte marker for `name` and returns its key.
    pub async fn create_folder(&self, name: &str) -> Result<String, AppError> {
        let key = normalize_folder_name(name)
            .ok_or_else(|| AppError::BadRequest("Folder name must not be empty".to_string()))?;

        tracing::info!("📁 Creating folder marker {}", key);
        run_bounded(self.timeout, self.write_marker(key)).await
    }

    async fn write_marker(&self, key: String) -> Result<String, AppError> {
        let result = self
            .storage
            .put_if_absent(
                &key,
                Some(FOLDER_MARKER_CONTENT_TYPE),
                Box::new(tokio::io::empty()),
            )
            .await;

        match result {
            Ok(_) => Ok(key),
            Err(StorageError::PreconditionFailed) => Err(AppError::AlreadyExists(key)),
            Err(e) => {
                tracing::error!("storage write error for folder {}: {}", key, e);
                Err(AppError::UploadFailed)
            }
        }
    }
}
