//! Status and refresh reporting types.

use crate::config::ConfigSummary;
use serde::Serialize;

/// Point-in-time view of one pooled resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    /// Resource key.
    pub key: String,
    /// Capacity of the resource's guard.
    pub concurrency_limit: usize,
    /// Permits free at the time of the snapshot.
    pub available_permits: usize,
    /// Permits held by checkouts (or a drain) at the time of the snapshot.
    pub in_use: usize,
    /// Summary of the configuration the current handle was built from.
    pub config: ConfigSummary,
}

/// What [`ResourcePool::refresh_one`](crate::ResourcePool::refresh_one) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// The key was in the source but not the pool; a slot was created.
    Added,
    /// The fingerprint changed; the handle was rebuilt and swapped in.
    Updated,
    /// The fingerprint matched; nothing changed.
    Unchanged,
}

/// What [`ResourcePool::refresh_all`](crate::ResourcePool::refresh_all) did.
///
/// Key lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Keys added to the pool.
    pub added: Vec<String>,
    /// Keys removed from the pool.
    pub removed: Vec<String>,
    /// Keys whose handle was rebuilt.
    pub updated: Vec<String>,
    /// Keys whose handle could not be built, with the reason. Skipped.
    pub failed: Vec<(String, String)>,
}

impl RefreshReport {
    /// Whether the refresh changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && self.failed.is_empty()
    }

    pub(crate) fn sort(&mut self) {
        self.added.sort();
        self.removed.sort();
        self.updated.sort();
        self.failed.sort();
    }
}
