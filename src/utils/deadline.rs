use crate::api::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Runs one external operation under `limit`. The inner future is dropped
/// (and its in-flight request cancelled) when the limit elapses.
pub async fn run_bounded<T, F>(limit: Duration, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("⏱️  Operation exceeded {:?}, cancelled", limit);
            Err(AppError::Timeout(limit))
        }
    }
}
