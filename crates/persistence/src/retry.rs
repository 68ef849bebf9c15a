//! Single transparent retry for idempotent reads.
//!
//! Writes never go through here: a write that fails with a transient error is
//! reported as `Unavailable` and left to the caller.

use std::future::Future;

use crate::error::is_transient;

/// Runs `op`, and once more if the first attempt failed transiently.
pub async fn retry_read<T, F, Fut>(operation: &'static str, mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    match op().await {
        Err(err) if is_transient(&err) => {
            tracing::warn!(operation, error = %err, "Transient read failure, retrying once");
            metrics::counter!("database_read_retries_total", "operation" => operation).increment(1);
            op().await
        }
        other => other,
    }
}
