//! Deadline wrapper applied to every store call the engine makes.

use std::future::Future;
use std::time::Duration;

use sweetshop_core::{InventoryError, InventoryResult};
use sweetshop_db::DbResult;
use tracing::warn;

/// Runs a store future under `timeout` and maps its error into the engine
/// taxonomy.
///
/// ```text
/// Ok(Ok(v))    → Ok(v)
/// Ok(Err(db))  → InventoryError::from(db)
/// Err(elapsed) → InventoryError::Timeout
/// ```
///
/// A timed-out future is dropped. A single-row update that already reached
/// SQLite stays applied.
pub(crate) async fn guarded<T, F>(timeout: Duration, op: &'static str, fut: F) -> InventoryResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(InventoryError::from),
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!(op, timeout_ms, "Store call timed out");
            Err(InventoryError::Timeout { timeout_ms })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetshop_db::DbError;

    #[tokio::test]
    async fn test_slow_store_call_times_out() {
        let result = guarded(Duration::from_millis(10), "slow", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, DbError>(1)
        })
        .await;

        assert_eq!(result, Err(InventoryError::Timeout { timeout_ms: 10 }));
        assert!(result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_store_errors_are_mapped() {
        let result: InventoryResult<()> = guarded(Duration::from_secs(1), "pool", async {
            Err(DbError::PoolExhausted)
        })
        .await;

        assert_eq!(result, Err(InventoryError::StoreUnavailable));
    }
}
