//! The per-key unit of pool state.

use crate::config::ResourceConfig;
use crate::guard::ConcurrencyGuard;
use parking_lot::RwLock;
use std::sync::Arc;

/// A built handle together with the configuration it was built from.
#[derive(Debug)]
pub(crate) struct Installed<C, H> {
    pub(crate) handle: Arc<H>,
    pub(crate) config: C,
}

impl<C, H> Clone for Installed<C, H>
where
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            config: self.config.clone(),
        }
    }
}

/// Handle, configuration snapshot and guard for one resource key.
///
/// Handle and configuration are swapped together under one write lock, so a
/// reader always sees a matching pair.
#[derive(Debug)]
pub struct ResourceSlot<C, H> {
    key: String,
    guard: ConcurrencyGuard,
    current: RwLock<Installed<C, H>>,
}

impl<C, H> ResourceSlot<C, H>
where
    C: ResourceConfig,
{
    pub(crate) fn new(config: C, handle: H, limit: u32) -> Self {
        Self {
            key: config.key().to_string(),
            guard: ConcurrencyGuard::new(limit),
            current: RwLock::new(Installed {
                handle: Arc::new(handle),
                config,
            }),
        }
    }

    /// The resource key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The slot's concurrency guard.
    #[must_use]
    pub fn guard(&self) -> &ConcurrencyGuard {
        &self.guard
    }

    /// The currently installed handle.
    #[must_use]
    pub fn handle(&self) -> Arc<H> {
        Arc::clone(&self.current.read().handle)
    }

    /// A copy of the configuration the current handle was built from.
    #[must_use]
    pub fn config(&self) -> C {
        self.current.read().config.clone()
    }

    /// Fingerprint of the current configuration.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.current.read().config.fingerprint()
    }

    pub(crate) fn installed(&self) -> Installed<C, H> {
        self.current.read().clone()
    }

    /// Swaps handle and configuration in place, returning the previous pair.
    pub(crate) fn replace(&self, config: C, handle: H) -> Installed<C, H> {
        let next = Installed {
            handle: Arc::new(handle),
            config,
        };
        core::mem::replace(&mut *self.current.write(), next)
    }
}
