//! The pool controller: initialization, checkout, reconciliation and teardown.
//!
//! # Policies
//!
//! - A factory failure for one key during [`ResourcePool::load`] or
//!   [`ResourcePool::refresh_all`] is logged and that key skipped; the rest of
//!   the pool keeps serving. [`ResourcePool::refresh_one`] surfaces it.
//! - Updates and removals wait for the slot's guard to drain before touching
//!   it, so no checkout ever sees its handle replaced mid-operation.
//! - A source failure aborts the operation before any slot is touched.

use crate::checkout::Checkout;
use crate::config::ResourceConfig;
use crate::error::{FactoryError, PoolError};
use crate::factory::ResourceFactory;
use crate::guard::{Drained, MAX_LIMIT};
use crate::registry::Registry;
use crate::settings::PoolSettings;
use crate::slot::ResourceSlot;
use crate::source::ConfigSource;
use crate::status::{RefreshOutcome, RefreshReport, ResourceStatus};
use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

type Slot<F> = ResourceSlot<<F as ResourceFactory>::Config, <F as ResourceFactory>::Handle>;

/// Keyed pool of long-lived handles built by a [`ResourceFactory`].
///
/// The pool is a plain value: build one per process with
/// [`initialize`](Self::initialize) and share the returned `Arc`, or keep it
/// in a [`PoolCell`](crate::PoolCell).
///
/// ```ignore
/// let pool = ResourcePool::initialize(factory, source, PoolSettings::default()).await?;
///
/// let handle = pool.checkout("m1").await?;
/// handle.call().await?;
/// drop(handle);
///
/// let report = pool.refresh_all().await?;
/// ```
pub struct ResourcePool<F: ResourceFactory> {
    factory: Arc<F>,
    source: Arc<dyn ConfigSource<F::Config>>,
    settings: PoolSettings,
    registry: Registry<F::Config, F::Handle>,
    key_locks: KeyLocks,
    closed: AtomicBool,
}

impl<F: ResourceFactory> core::fmt::Debug for ResourcePool<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<F: ResourceFactory> ResourcePool<F> {
    /// Creates an empty pool. Call [`load`](Self::load) to populate it.
    #[must_use]
    pub fn new(
        factory: F,
        source: Arc<dyn ConfigSource<F::Config>>,
        settings: PoolSettings,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            source,
            settings,
            registry: Registry::default(),
            key_locks: KeyLocks::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a pool and loads every active configuration into it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Initialization`] if the source cannot be queried.
    /// Factory failures for individual keys are logged and skipped.
    pub async fn initialize(
        factory: F,
        source: Arc<dyn ConfigSource<F::Config>>,
        settings: PoolSettings,
    ) -> Result<Arc<Self>, PoolError> {
        let pool = Self::new(factory, source, settings);
        pool.load().await?;
        Ok(Arc::new(pool))
    }

    /// Builds a slot for every active configuration not already pooled.
    ///
    /// Returns the number of slots added.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Initialization`] if the source cannot be queried.
    pub async fn load(&self) -> Result<usize, PoolError> {
        self.ensure_open()?;
        let configs = self.source.list_active().map_err(PoolError::Initialization)?;
        let total = configs.len();

        let mut added = 0;
        for config in configs {
            let key = config.key().to_string();
            let _lock = self.key_locks.lock(&key).await;
            if self.registry.contains(&key) {
                continue;
            }
            match self.add(config).await {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(PoolError::NotInitialized) => return Err(PoolError::NotInitialized),
                Err(err) => tracing::warn!(key = %key, error = %err, "skipping resource"),
            }
        }
        self.key_locks.prune();

        tracing::info!(added, configured = total, "resource pool loaded");
        Ok(added)
    }

    /// The factory building this pool's handles.
    #[must_use]
    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    /// The pool settings.
    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Number of pooled resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the pool holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a resource with `key` is pooled.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.registry.contains(key)
    }

    /// Pooled keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.registry.keys()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Checkout
    // ─────────────────────────────────────────────────────────────────────────

    /// Borrows the handle for `key`, waiting for a free permit.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ResourceNotFound`] if `key` is not pooled (no waiting),
    ///   or the slot is removed while waiting.
    /// - [`PoolError::AcquireTimeout`] if the configured acquire timeout elapses.
    pub async fn checkout(&self, key: &str) -> Result<Checkout<F::Handle>, PoolError> {
        self.checkout_with(key, &CancellationToken::new()).await
    }

    /// Like [`checkout`](Self::checkout), abandoning the wait when `cancel` fires.
    ///
    /// A cancelled wait takes no permit.
    ///
    /// # Errors
    ///
    /// As [`checkout`](Self::checkout), plus [`PoolError::Cancelled`].
    pub async fn checkout_with(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Checkout<F::Handle>, PoolError> {
        self.ensure_open()?;
        let slot = self.registry.get(key).ok_or_else(|| PoolError::not_found(key))?;

        let permit = match wait(cancel, self.settings.acquire_timeout, slot.guard().acquire()).await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => return Err(PoolError::not_found(key)),
            Err(Interrupted::Cancelled) => return Err(PoolError::Cancelled),
            Err(Interrupted::TimedOut(timeout)) => {
                return Err(PoolError::AcquireTimeout {
                    key: key.to_string(),
                    timeout,
                });
            }
        };

        // Read after the permit: a swap completed while we waited must be visible.
        let installed = slot.installed();
        tracing::debug!(
            key,
            available = slot.guard().available(),
            "checkout acquired"
        );
        Ok(Checkout::new(
            key,
            installed.config.fingerprint(),
            installed.handle,
            permit,
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    /// Reconciles one key against the configuration source.
    ///
    /// Adds the key if it is new, rebuilds its handle if the fingerprint or
    /// the concurrency limit changed (after in-flight checkouts finish), and
    /// otherwise does nothing.
    /// Keys are never removed here; use [`refresh_all`](Self::refresh_all).
    ///
    /// # Errors
    ///
    /// - [`PoolError::ResourceNotFound`] if the source has no active config for `key`.
    /// - [`PoolError::SourceUnavailable`] if the source cannot be queried.
    /// - [`PoolError::Factory`] if the new handle cannot be built.
    /// - [`PoolError::DrainTimeout`] if in-flight work outlasts the drain timeout.
    pub async fn refresh_one(&self, key: &str) -> Result<RefreshOutcome, PoolError> {
        self.refresh_one_with(key, &CancellationToken::new()).await
    }

    /// Like [`refresh_one`](Self::refresh_one), abortable through `cancel`.
    ///
    /// An aborted refresh leaves the slot serving its previous handle.
    ///
    /// # Errors
    ///
    /// As [`refresh_one`](Self::refresh_one), plus [`PoolError::Cancelled`].
    pub async fn refresh_one_with(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<RefreshOutcome, PoolError> {
        self.ensure_open()?;
        let outcome = self.refresh_one_locked(key, cancel).await;
        self.key_locks.prune();
        outcome
    }

    async fn refresh_one_locked(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<RefreshOutcome, PoolError> {
        let _lock = self.lock_key(key, cancel).await?;

        let config = self
            .source
            .get_by_key(key)?
            .ok_or_else(|| PoolError::not_found(key))?;

        match self.registry.get(key) {
            None => {
                self.add(config).await?;
                Ok(RefreshOutcome::Added)
            }
            Some(slot) if !self.needs_update(&slot, &config) => {
                tracing::debug!(key, "resource unchanged");
                Ok(RefreshOutcome::Unchanged)
            }
            Some(slot) => {
                self.update(&slot, config, cancel).await?;
                Ok(RefreshOutcome::Updated)
            }
        }
    }

    /// Reconciles the whole pool against the configuration source.
    ///
    /// Removes keys missing from the source, adds new keys, and rebuilds keys
    /// whose fingerprint or limit changed, in that order. Untouched keys keep their
    /// handle. Per-key build or drain failures are reported in
    /// [`RefreshReport::failed`] and leave that key as it was.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::SourceUnavailable`] without touching the pool if
    /// the source cannot be queried.
    pub async fn refresh_all(&self) -> Result<RefreshReport, PoolError> {
        self.refresh_all_with(&CancellationToken::new()).await
    }

    /// Like [`refresh_all`](Self::refresh_all), abortable through `cancel`.
    ///
    /// Actions completed before cancellation stay applied; the slot being
    /// drained when `cancel` fires is left unchanged.
    ///
    /// # Errors
    ///
    /// As [`refresh_all`](Self::refresh_all), plus [`PoolError::Cancelled`].
    pub async fn refresh_all_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshReport, PoolError> {
        self.ensure_open()?;
        let desired: HashMap<String, F::Config> = self
            .source
            .list_active()?
            .into_iter()
            .map(|config| (config.key().to_string(), config))
            .collect();

        let current = self.registry.slots();
        let pooled: HashSet<&str> = current.iter().map(|slot| slot.key()).collect();

        let removals: Vec<_> = current
            .iter()
            .filter(|slot| !desired.contains_key(slot.key()))
            .cloned()
            .collect();
        let additions: Vec<_> = desired
            .values()
            .filter(|config| !pooled.contains(config.key()))
            .cloned()
            .collect();
        let updates: Vec<_> = current
            .iter()
            .filter_map(|slot| {
                let config = desired.get(slot.key())?;
                self.needs_update(slot, config)
                    .then(|| (Arc::clone(slot), config.clone()))
            })
            .collect();

        let mut report = RefreshReport::default();

        for slot in removals {
            let key = slot.key().to_string();
            let _lock = self.lock_key(&key, cancel).await?;
            match self.remove(&slot, cancel).await {
                Ok(true) => report.removed.push(key),
                Ok(false) => {}
                Err(err) => record_failure(&mut report, key, err)?,
            }
        }

        for config in additions {
            let key = config.key().to_string();
            let _lock = self.lock_key(&key, cancel).await?;
            if self.registry.contains(&key) {
                continue;
            }
            match self.add(config).await {
                Ok(true) => report.added.push(key),
                Ok(false) => {}
                Err(err) => record_failure(&mut report, key, err)?,
            }
        }

        for (slot, config) in updates {
            let key = slot.key().to_string();
            let _lock = self.lock_key(&key, cancel).await?;
            let still_pooled = self
                .registry
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(&current, &slot));
            if !still_pooled || !self.needs_update(&slot, &config) {
                continue;
            }
            match self.update(&slot, config, cancel).await {
                Ok(()) => report.updated.push(key),
                Err(err) => record_failure(&mut report, key, err)?,
            }
        }

        self.key_locks.prune();
        report.sort();
        tracing::info!(
            added = report.added.len(),
            removed = report.removed.len(),
            updated = report.updated.len(),
            failed = report.failed.len(),
            "resource pool refreshed"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Status & teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of every pooled resource, sorted by key. Never blocks on checkouts.
    #[must_use]
    pub fn status(&self) -> Vec<ResourceStatus> {
        self.registry
            .slots()
            .into_iter()
            .map(|slot| {
                let guard = slot.guard();
                ResourceStatus {
                    key: slot.key().to_string(),
                    concurrency_limit: guard.limit(),
                    available_permits: guard.available(),
                    in_use: guard.in_use(),
                    config: slot.config().summary(),
                }
            })
            .collect()
    }

    /// Status of one resource, if pooled.
    #[must_use]
    pub fn status_of(&self, key: &str) -> Option<ResourceStatus> {
        self.status().into_iter().find(|status| status.key == key)
    }

    /// Drains and tears down every slot, leaving the pool closed.
    ///
    /// In-flight checkouts are allowed to finish. Afterwards every operation
    /// fails with [`PoolError::NotInitialized`].
    pub async fn cleanup(&self) {
        self.closed.store(true, Ordering::Release);
        let slots = self.registry.take_all();
        let count = slots.len();

        for slot in slots {
            let never = CancellationToken::new();
            let drained = wait(&never, self.settings.drain_timeout, slot.guard().drain()).await;
            if let Err(Interrupted::TimedOut(timeout)) = drained {
                tracing::warn!(
                    key = %slot.key(),
                    ?timeout,
                    "tearing down resource with work in flight"
                );
            }
            slot.guard().close();
            let installed = slot.installed();
            self.factory.teardown(&installed.config, &installed.handle).await;
        }

        tracing::info!(released = count, "resource pool cleaned up");
    }

    /// Whether [`cleanup`](Self::cleanup) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Slot mutations (callers hold the key lock)
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), PoolError> {
        if self.is_closed() {
            Err(PoolError::NotInitialized)
        } else {
            Ok(())
        }
    }

    async fn lock_key(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<OwnedMutexGuard<()>, PoolError> {
        wait(cancel, None, self.key_locks.lock(key))
            .await
            .map_err(|_| PoolError::Cancelled)
    }

    fn limit_for(&self, config: &F::Config) -> Result<u32, FactoryError> {
        let limit = config
            .concurrency_limit()
            .unwrap_or(self.settings.default_concurrency);
        if limit == 0 {
            return Err(FactoryError::invalid_config("concurrency limit must be at least 1"));
        }
        if limit > MAX_LIMIT {
            return Err(FactoryError::invalid_config(format!(
                "concurrency limit {limit} exceeds the maximum of {MAX_LIMIT}"
            )));
        }
        u32::try_from(limit).map_err(|_| {
            FactoryError::invalid_config(format!("concurrency limit {limit} out of range"))
        })
    }

    /// Whether `config` differs from what `slot` was built with.
    ///
    /// A limit change alone counts; an invalid limit also triggers an update,
    /// which then fails and reports it.
    fn needs_update(&self, slot: &Slot<F>, config: &F::Config) -> bool {
        slot.fingerprint() != config.fingerprint()
            || !self
                .limit_for(config)
                .is_ok_and(|limit| limit as usize == slot.guard().limit())
    }

    async fn build(&self, config: &F::Config) -> Result<(F::Handle, u32), PoolError> {
        let key = config.key();
        let limit = self.limit_for(config).map_err(|err| PoolError::factory(key, err))?;
        let handle = self
            .factory
            .build(config)
            .await
            .map_err(|err| PoolError::factory(key, err))?;
        Ok((handle, limit))
    }

    async fn drain(&self, slot: &Slot<F>, cancel: &CancellationToken) -> Result<Drained, PoolError> {
        match wait(cancel, self.settings.drain_timeout, slot.guard().drain()).await {
            Ok(Ok(drained)) => Ok(drained),
            Ok(Err(_closed)) => Err(PoolError::not_found(slot.key())),
            Err(Interrupted::Cancelled) => Err(PoolError::Cancelled),
            Err(Interrupted::TimedOut(timeout)) => Err(PoolError::DrainTimeout {
                key: slot.key().to_string(),
                timeout,
            }),
        }
    }

    /// Builds and inserts a slot. Returns `false` if the key was already taken.
    async fn add(&self, config: F::Config) -> Result<bool, PoolError> {
        let (handle, limit) = self.build(&config).await?;
        let fingerprint = config.fingerprint();

        match self.registry.insert(ResourceSlot::new(config, handle, limit)) {
            Ok(slot) if self.is_closed() => {
                // Cleanup ran while the handle was being built.
                if self.registry.remove(slot.key(), &slot).is_some() {
                    slot.guard().close();
                    let installed = slot.installed();
                    self.factory.teardown(&installed.config, &installed.handle).await;
                }
                Err(PoolError::NotInitialized)
            }
            Ok(slot) => {
                tracing::info!(key = %slot.key(), %fingerprint, limit, "resource added");
                Ok(true)
            }
            Err(rejected) => {
                let installed = rejected.installed();
                self.factory.teardown(&installed.config, &installed.handle).await;
                Ok(false)
            }
        }
    }

    /// Rebuilds a slot's handle from `config` once its guard has drained.
    async fn update(
        &self,
        slot: &Arc<Slot<F>>,
        config: F::Config,
        cancel: &CancellationToken,
    ) -> Result<(), PoolError> {
        let key = slot.key();
        let (handle, limit) = self.build(&config).await?;

        let drained = match self.drain(slot, cancel).await {
            Ok(drained) => drained,
            Err(err) => {
                self.factory.teardown(&config, &handle).await;
                return Err(err);
            }
        };

        let fingerprint = config.fingerprint();
        match self.registry.replace(key, slot, config, handle) {
            Ok(previous) => {
                drained.release_into(slot.guard(), limit);
                self.factory
                    .teardown(&previous.config, &previous.handle)
                    .await;
                tracing::info!(
                    key,
                    from = %previous.config.fingerprint(),
                    to = %fingerprint,
                    limit,
                    "resource updated"
                );
                Ok(())
            }
            Err((config, handle)) => {
                drop(drained);
                self.factory.teardown(&config, &handle).await;
                self.ensure_open()?;
                Err(PoolError::not_found(key))
            }
        }
    }

    /// Drains, unregisters and tears down a slot. Returns `false` if it was already gone.
    async fn remove(&self, slot: &Arc<Slot<F>>, cancel: &CancellationToken) -> Result<bool, PoolError> {
        let key = slot.key();
        let drained = self.drain(slot, cancel).await?;

        if self.registry.remove(key, slot).is_none() {
            return Ok(false);
        }
        // Checkouts queued behind the drain observe the closed guard as "not found".
        slot.guard().close();
        drop(drained);

        let installed = slot.installed();
        self.factory
            .teardown(&installed.config, &installed.handle)
            .await;
        tracing::info!(key, "resource removed");
        Ok(true)
    }
}

fn record_failure(report: &mut RefreshReport, key: String, err: PoolError) -> Result<(), PoolError> {
    match err {
        PoolError::Cancelled | PoolError::NotInitialized => Err(err),
        err => {
            tracing::warn!(key = %key, error = %err, "skipping resource during refresh");
            report.failed.push((key, err.to_string()));
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Waiting
// ─────────────────────────────────────────────────────────────────────────────

enum Interrupted {
    Cancelled,
    TimedOut(Duration),
}

/// Runs `fut` until it completes, `cancel` fires, or `timeout` elapses.
///
/// Cancellation wins ties so an already-cancelled caller never acquires.
async fn wait<T>(
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    fut: impl Future<Output = T>,
) -> Result<T, Interrupted> {
    let bounded = async {
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| Interrupted::TimedOut(timeout)),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Interrupted::Cancelled),
        result = bounded => result,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-key mutation locks
// ─────────────────────────────────────────────────────────────────────────────

/// Serializes structural mutations that target the same key.
#[derive(Default)]
struct KeyLocks {
    locks: parking_lot::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.locks
                .lock()
                .entry_ref(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        );
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits on.
    fn prune(&self) {
        self.locks
            .lock()
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
