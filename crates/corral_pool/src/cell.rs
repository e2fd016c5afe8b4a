//! Process-wide pool handle.

use crate::error::PoolError;
use crate::factory::ResourceFactory;
use crate::pool::ResourcePool;
use core::future::Future;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Holds at most one initialized [`ResourcePool`], shareable from a `static`.
///
/// # Lifecycle
///
/// `Uninitialized → initialize() → Ready → cleanup() → Uninitialized`.
/// [`initialize`](Self::initialize) and [`cleanup`](Self::cleanup) are
/// serialized by one startup lock, so concurrent callers of `initialize`
/// all receive the pool built by the first.
///
/// ```ignore
/// static MODELS: PoolCell<ModelFactory> = PoolCell::new();
///
/// MODELS
///     .initialize(|| ResourcePool::initialize(factory, source, settings))
///     .await?;
///
/// let model = MODELS.get()?.checkout("gpt-4o").await?;
/// ```
pub struct PoolCell<F: ResourceFactory> {
    startup: AsyncMutex<()>,
    pool: RwLock<Option<Arc<ResourcePool<F>>>>,
}

impl<F: ResourceFactory> Default for PoolCell<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ResourceFactory> core::fmt::Debug for PoolCell<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolCell")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl<F: ResourceFactory> PoolCell<F> {
    /// Creates an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            startup: AsyncMutex::const_new(()),
            pool: parking_lot::const_rwlock(None),
        }
    }

    /// Initializes the cell with the pool produced by `make`, once.
    ///
    /// Returns the existing pool without calling `make` if already initialized.
    ///
    /// # Errors
    ///
    /// Propagates the error from `make`; the cell stays uninitialized.
    pub async fn initialize<M, Fut>(&self, make: M) -> Result<Arc<ResourcePool<F>>, PoolError>
    where
        M: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<ResourcePool<F>>, PoolError>>,
    {
        let _startup = self.startup.lock().await;
        if let Some(pool) = self.current() {
            return Ok(pool);
        }

        let pool = make().await?;
        *self.pool.write() = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Returns the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotInitialized`] before [`initialize`](Self::initialize) completes.
    pub fn get(&self) -> Result<Arc<ResourcePool<F>>, PoolError> {
        self.current().ok_or(PoolError::NotInitialized)
    }

    /// Whether the cell holds a pool.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.pool.read().is_some()
    }

    /// Cleans up the pool, if any, and resets the cell so it can be initialized again.
    pub async fn cleanup(&self) {
        let _startup = self.startup.lock().await;
        let pool = self.pool.write().take();
        if let Some(pool) = pool {
            pool.cleanup().await;
        }
    }

    fn current(&self) -> Option<Arc<ResourcePool<F>>> {
        self.pool.read().clone()
    }
}
