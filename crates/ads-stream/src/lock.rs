use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

/// A cross-replica mutual-exclusion lock guarding the write pipeline's
/// "read max version, assign next, append" critical section.
/// Exactly one writer may hold a given `key` at a time, across every process
/// talking to the same backing store.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Attempts to acquire `key`, retrying for up to `wait` before giving up.
    /// The returned guard releases the lock when dropped, but callers that
    /// need to observe release failures should call
    /// [`LockGuard::release`] explicitly.
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> Result<LockGuard, Error>;
}

/// An active hold on a [`DistributedLock`]. Dropping it best-effort releases
/// the lock in the background; call [`LockGuard::release`] to await the
/// release and observe errors.
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() -> ReleaseFuture + Send>>,
}

type ReleaseFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), Error>> + Send>>;

impl LockGuard {
    pub(crate) fn new<F, Fut>(release: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), Error>> + Send + 'static,
    {
        Self {
            release: Some(Box::new(move || Box::pin(release()))),
        }
    }

    /// A guard that releases nothing, for lock implementations (and fakes)
    /// where there is no external state to clean up.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Awaits release explicitly, returning the backing error (if any)
    /// instead of swallowing it the way `Drop` must.
    pub async fn release(mut self) -> Result<(), Error> {
        match self.release.take() {
            Some(release) => release().await,
            None => Ok(()),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tokio::spawn(async move {
                if let Err(err) = release().await {
                    tracing::warn!(%err, "failed to release distributed lock on drop");
                }
            });
        }
    }
}
