//! The [`ResourceConfig`] trait describing how a pooled resource is built.

use serde::Serialize;

/// Declarative configuration for one pooled resource.
///
/// Implementations are plain value objects owned by a [`ConfigSource`](crate::ConfigSource).
/// The pool keeps a read-only clone per slot, taken when the slot was built.
pub trait ResourceConfig: Clone + Send + Sync + 'static {
    /// Unique key of the resource (e.g. a deployment name or bot id).
    fn key(&self) -> &str;

    /// Provider identifier used to pick a factory from a [`ProviderTable`](crate::ProviderTable).
    fn provider(&self) -> &str;

    /// Version marker; a change means the handle must be rebuilt.
    fn fingerprint(&self) -> String;

    /// Human-readable name shown in status listings. Defaults to the key.
    fn display_name(&self) -> &str {
        self.key()
    }

    /// Concurrency limit for this resource. `None` uses the pool default.
    fn concurrency_limit(&self) -> Option<usize> {
        None
    }

    /// Whether the resource should exist in the pool.
    fn is_active(&self) -> bool {
        true
    }

    /// Summary used by status listings.
    fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            name: self.display_name().to_string(),
            provider: self.provider().to_string(),
            fingerprint: self.fingerprint(),
        }
    }
}

/// Condensed view of a [`ResourceConfig`] for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    /// Display name.
    pub name: String,
    /// Provider identifier.
    pub provider: String,
    /// Fingerprint of the configuration the handle was built from.
    pub fingerprint: String,
}

/// Computes a stable hex digest over a sequence of serialized parts.
///
/// Used by configs that carry no explicit version to derive a fingerprint
/// from the fields that determine their handle. FNV-1a, so the value is
/// identical across processes and releases.
#[must_use]
pub fn digest<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    let mut hash = OFFSET;
    for part in parts {
        for byte in part.bytes().chain(core::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    format!("{hash:016x}")
}
