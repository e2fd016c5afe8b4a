//! Key to slot mapping with structurally serialized mutation.
//!
//! The registry lock is only ever held for a map operation or an in-place
//! swap. Handle construction and drain waits happen outside it.

use crate::config::ResourceConfig;
use crate::slot::{Installed, ResourceSlot};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Mapping from resource key to [`ResourceSlot`].
pub(crate) struct Registry<C, H> {
    slots: RwLock<HashMap<String, Arc<ResourceSlot<C, H>>>>,
}

impl<C, H> core::fmt::Debug for Registry<C, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.slots.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C, H> Default for Registry<C, H> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<C, H> Registry<C, H>
where
    C: ResourceConfig,
{
    pub(crate) fn get(&self, key: &str) -> Option<Arc<ResourceSlot<C, H>>> {
        self.slots.read().get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.slots.read().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.slots.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of every slot, sorted by key.
    pub(crate) fn slots(&self) -> Vec<Arc<ResourceSlot<C, H>>> {
        let mut slots: Vec<_> = self.slots.read().values().cloned().collect();
        slots.sort_by(|a, b| a.key().cmp(b.key()));
        slots
    }

    /// Inserts `slot` unless its key is taken.
    ///
    /// On conflict the rejected slot is handed back so its handle can be torn down.
    pub(crate) fn insert(
        &self,
        slot: ResourceSlot<C, H>,
    ) -> Result<Arc<ResourceSlot<C, H>>, ResourceSlot<C, H>> {
        let mut slots = self.slots.write();
        if slots.contains_key(slot.key()) {
            return Err(slot);
        }
        let slot = Arc::new(slot);
        slots.insert(slot.key().to_string(), Arc::clone(&slot));
        Ok(slot)
    }

    /// Removes the slot for `key`, if it is still `expected`.
    pub(crate) fn remove(
        &self,
        key: &str,
        expected: &Arc<ResourceSlot<C, H>>,
    ) -> Option<Arc<ResourceSlot<C, H>>> {
        let mut slots = self.slots.write();
        match slots.get(key) {
            Some(current) if Arc::ptr_eq(current, expected) => slots.remove(key),
            _ => None,
        }
    }

    /// Swaps the handle of the slot for `key` in place under the registry lock.
    ///
    /// Returns `Err` with the unused inputs if `expected` is no longer registered.
    pub(crate) fn replace(
        &self,
        key: &str,
        expected: &Arc<ResourceSlot<C, H>>,
        config: C,
        handle: H,
    ) -> Result<Installed<C, H>, (C, H)> {
        let slots = self.slots.write();
        match slots.get(key) {
            Some(current) if Arc::ptr_eq(current, expected) => Ok(current.replace(config, handle)),
            _ => Err((config, handle)),
        }
    }

    /// Removes every slot, returning them.
    pub(crate) fn take_all(&self) -> Vec<Arc<ResourceSlot<C, H>>> {
        let mut slots: Vec<_> = self.slots.write().drain().map(|(_, slot)| slot).collect();
        slots.sort_by(|a, b| a.key().cmp(b.key()));
        slots
    }
}
