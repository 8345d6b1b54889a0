//! Timeouts and bounded retries around remote store calls.

use crate::traits::{AssetStore, StorageError, StorageResult};
use boom_core::models::RemoteAsset;
use boom_core::UploadConfig;
use std::future::Future;
use std::time::Duration;

/// How hard to try when deleting a remote asset
#[derive(Debug, Clone)]
pub struct DeleteRetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub initial_delay: Duration,
    /// Bound on each individual attempt
    pub request_timeout: Duration,
}

impl Default for DeleteRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DeleteRetryPolicy {
    pub fn from_upload_config(config: &UploadConfig) -> Self {
        Self {
            max_attempts: config.delete_max_attempts,
            initial_delay: config.delete_retry_delay,
            request_timeout: config.remote_request_timeout,
        }
    }
}

/// Run a store call with an upper bound; running out of time is a `Timeout` error.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(timeout)),
    }
}

/// Delete a remote asset, retrying with exponential backoff.
///
/// Gives up after `max_attempts` and returns the last error. Callers treat the error as
/// a leaked object, never as a reason to fail the surrounding request.
pub async fn delete_with_retry(
    store: &dyn AssetStore,
    asset: &RemoteAsset,
    policy: &DeleteRetryPolicy,
) -> StorageResult<()> {
    let attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut last_error = None;

    for attempt in 1..=attempts {
        match with_timeout(
            policy.request_timeout,
            store.delete(&asset.remote_id, asset.kind),
        )
        .await
        {
            Ok(()) => {
                if attempt > 1 {
                    tracing::info!(
                        remote_id = %asset.remote_id,
                        kind = %asset.kind,
                        attempt,
                        "Remote asset deleted after retry"
                    );
                }
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    remote_id = %asset.remote_id,
                    kind = %asset.kind,
                    attempt,
                    max_attempts = attempts,
                    "Remote asset delete attempt failed"
                );
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| StorageError::DeleteFailed(asset.remote_id.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use boom_core::models::AssetKind;
    use boom_core::StorageBackend;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::traits::StoredObject;

    /// Fails the first `failures` deletes, optionally by hanging past the timeout.
    struct FlakyStore {
        failures: u32,
        hang: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AssetStore for FlakyStore {
        async fn put(&self, _: &Path, _: AssetKind, _: &str) -> StorageResult<RemoteAsset> {
            unreachable!()
        }

        async fn delete(&self, remote_id: &str, _: AssetKind) -> StorageResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                if self.hang {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                return Err(StorageError::DeleteFailed(remote_id.to_string()));
            }
            Ok(())
        }

        async fn list(&self, _: &str) -> StorageResult<Vec<StoredObject>> {
            Ok(vec![])
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Memory
        }
    }

    fn asset() -> RemoteAsset {
        RemoteAsset::new("boom-videos/x.mp4", "https://cdn/x.mp4", AssetKind::Video)
    }

    fn policy(max_attempts: u32) -> DeleteRetryPolicy {
        DeleteRetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            request_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let store = FlakyStore {
            failures: 2,
            hang: false,
            calls: AtomicU32::new(0),
        };
        delete_with_retry(&store, &asset(), &policy(3)).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = FlakyStore {
            failures: 10,
            hang: false,
            calls: AtomicU32::new(0),
        };
        let result = delete_with_retry(&store, &asset(), &policy(3)).await;
        assert!(matches!(result, Err(StorageError::DeleteFailed(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_hanging_delete_times_out() {
        let store = FlakyStore {
            failures: 1,
            hang: true,
            calls: AtomicU32::new(0),
        };
        let result = delete_with_retry(&store, &asset(), &policy(1)).await;
        assert!(matches!(result, Err(StorageError::Timeout(_))));
    }
}
