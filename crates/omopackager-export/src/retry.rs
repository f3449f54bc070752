//! Bounded retries with exponential backoff for warehouse fetches.

use std::future::Future;

use omopackager_warehouse::WarehouseResult;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{ExportError, Section};

/// Runs `op` until it succeeds, fails fatally, or the attempts run out.
///
/// Only transient warehouse errors are retried. The final error is
/// classified into `TransientDataSource` or `FatalDataSource` for `section`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, section: Section, mut op: F) -> Result<T, ExportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WarehouseResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    %section,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient data source error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(ExportError::data_source(section, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use omopackager_warehouse::WarehouseError;

    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_transient_error_is_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(3), Section::Measurements, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(WarehouseError::transient("deadlock detected"))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_error_surfaces_after_last_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(2), Section::Diseases, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(WarehouseError::transient("serialization failure"))
        })
        .await;
        assert!(matches!(
            result,
            Err(ExportError::TransientDataSource {
                section: Section::Diseases,
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(5), Section::Subject, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(WarehouseError::fatal("pool timed out"))
        })
        .await;
        assert!(matches!(result, Err(ExportError::FatalDataSource { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
