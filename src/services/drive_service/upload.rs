use crate::api::error::AppError;
use crate::models::StoredObject;
use crate::services::storage::StorageError;
use crate::utils::deadline::run_bounded;
use crate::utils::keys::join_key;
use tokio::io::AsyncRead;

use super::DriveService;

/// Declared content types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Checks the declared type only; parameters such as `charset` are ignored.
pub fn is_allowed_content_type(content_type: Option<&str>) -> bool {
    let Some(raw) = content_type else {
        return false;
    };
    match raw.trim().to_ascii_lowercase().parse::<mime::Mime>() {
        Ok(parsed) => ALLOWED_CONTENT_TYPES.contains(&parsed.essence_str()),
        Err(_) => false,
    }
}

impl DriveService {
    /// Streams `body` to `join(path, file_name)`. Fails if the key is taken.
    pub async fn upload<'a>(
        &self,
        path: &str,
        file_name: &str,
        content_type: Option<&str>,
        body: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StoredObject, AppError> {
        if !is_allowed_content_type(content_type) {
            tracing::warn!(
                "Rejected upload of {:?} with content type {:?}",
                file_name,
                content_type
            );
            return Err(AppError::InvalidFileType);
        }

        if file_name.trim().is_empty() {
            return Err(AppError::BadRequest("Missing file name".to_string()));
        }
        let key = join_key(path, file_name);

        tracing::info!("⬆️  Uploading {} ({:?})", key, content_type);
        run_bounded(self.timeout, async {
            match self.storage.put_if_absent(&key, content_type, body).await {
                Ok(size) => Ok(StoredObject {
                    key: key.clone(),
                    size,
                }),
                Err(StorageError::PreconditionFailed) => {
                    tracing::warn!("storage write rejected, {} already exists", key);
                    Err(AppError::UploadFailed)
                }
                Err(e) => {
                    tracing::error!("storage write error for {}: {}", key, e);
                    Err(AppError::UploadFailed)
                }
            }
        })
        .await
    }
}
