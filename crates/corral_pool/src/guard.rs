//! Per-resource concurrency limiting.
//!
//! A [`ConcurrencyGuard`] is a counting permit set over a tokio [`Semaphore`].
//! Checkouts take one permit; a drain takes every permit at once, which both
//! waits for in-flight work to finish and holds back new checkouts until the
//! drain is released.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Largest capacity a guard accepts.
///
/// A drain takes every permit in one `acquire_many` call, which counts in
/// `u32`, and the semaphore itself caps at [`Semaphore::MAX_PERMITS`].
pub const MAX_LIMIT: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

/// Counting permit set with a fixed capacity.
///
/// Available permits always lie in `[0, limit]`.
#[derive(Debug)]
pub struct ConcurrencyGuard {
    semaphore: Arc<Semaphore>,
    limit: AtomicU32,
}

impl ConcurrencyGuard {
    /// Creates a guard with `limit` permits, all available.
    ///
    /// # Panics
    ///
    /// Panics if `limit` exceeds [`MAX_LIMIT`].
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit as usize)),
            limit: AtomicU32::new(limit),
        }
    }

    /// The configured capacity.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit.load(Ordering::Acquire) as usize
    }

    /// Permits currently free. Never blocks.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held by checkouts or a drain.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.limit().saturating_sub(self.available())
    }

    /// Whether the guard was closed by a removal.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Waits for one permit.
    ///
    /// Dropping the returned future before it completes takes no permit.
    ///
    /// # Errors
    ///
    /// Fails if the guard is closed while waiting.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Waits until every permit is free and takes them all.
    ///
    /// Later [`acquire`](Self::acquire) calls queue behind the drain, so once
    /// this has started no new checkout can slip in before it is released.
    ///
    /// # Errors
    ///
    /// Fails if the guard is closed while waiting.
    pub async fn drain(&self) -> Result<Drained, AcquireError> {
        let limit = self.limit.load(Ordering::Acquire);
        let permit = Arc::clone(&self.semaphore).acquire_many_owned(limit).await?;
        Ok(Drained {
            permit,
            semaphore: Arc::clone(&self.semaphore),
            limit,
        })
    }

    /// Closes the guard: pending and future acquires fail.
    pub fn close(&self) {
        self.semaphore.close();
    }

    fn resize(&self, drained: Drained, new_limit: u32) {
        let Drained {
            permit, semaphore, ..
        } = drained;
        // Forgetting the drain permit leaves zero available; adding the new
        // capacity back keeps the count inside [0, new_limit].
        permit.forget();
        self.limit.store(new_limit, Ordering::Release);
        semaphore.add_permits(new_limit as usize);
    }
}

/// Every permit of a [`ConcurrencyGuard`], held exclusively.
///
/// Dropping it returns the permits and reopens the guard to checkouts.
#[derive(Debug)]
#[must_use = "dropping a drain immediately releases the guard"]
pub struct Drained {
    permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
    limit: u32,
}

impl Drained {
    /// Number of permits held.
    #[must_use]
    pub fn permits(&self) -> usize {
        self.limit as usize
    }

    /// Releases the drain, resizing `guard` to `new_limit` when it changed.
    pub fn release_into(self, guard: &ConcurrencyGuard, new_limit: u32) {
        if new_limit == self.limit {
            drop(self);
        } else {
            guard.resize(self, new_limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[tokio::test]
    async fn acquire_and_release_track_available() {
        let guard = ConcurrencyGuard::new(2);
        assert_eq!(guard.available(), 2);

        let a = guard.acquire().await.unwrap();
        let b = guard.acquire().await.unwrap();
        assert_eq!(guard.available(), 0);
        assert_eq!(guard.in_use(), 2);

        drop(a);
        assert_eq!(guard.available(), 1);
        drop(b);
        assert_eq!(guard.available(), 2);
    }

    #[tokio::test]
    async fn drain_waits_for_in_flight_permits() {
        let guard = Arc::new(ConcurrencyGuard::new(2));
        let held = guard.acquire().await.unwrap();

        let drain = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.drain().await.map(|d| d.permits()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!drain.is_finished());

        drop(held);
        assert_eq!(drain.await.unwrap().unwrap(), 2);
        assert_eq!(guard.available(), 2);
    }

    #[tokio::test]
    async fn acquire_queues_behind_pending_drain() {
        let guard = Arc::new(ConcurrencyGuard::new(1));
        let held = guard.acquire().await.unwrap();

        let drain = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move {
                let drained = guard.drain().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                drop(drained);
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Released permit goes to the drain, not to this new acquire.
        drop(held);
        let late = tokio::time::timeout(Duration::from_millis(5), guard.acquire()).await;
        assert!(late.is_err());

        drain.await.unwrap();
        assert!(guard.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn release_into_resizes_capacity() {
        let guard = ConcurrencyGuard::new(3);

        let drained = guard.drain().await.unwrap();
        assert_eq!(guard.available(), 0);
        drained.release_into(&guard, 5);
        assert_eq!(guard.limit(), 5);
        assert_eq!(guard.available(), 5);

        let drained = guard.drain().await.unwrap();
        drained.release_into(&guard, 1);
        assert_eq!(guard.limit(), 1);
        assert_eq!(guard.available(), 1);
    }

    #[tokio::test]
    async fn close_fails_waiters() {
        let guard = Arc::new(ConcurrencyGuard::new(1));
        let _held = guard.acquire().await.unwrap();

        let waiter = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.acquire().await.is_err() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        guard.close();
        assert!(waiter.await.unwrap());
        assert!(guard.is_closed());
    }
}
