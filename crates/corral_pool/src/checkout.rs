//! Scoped handle checkouts.

use core::fmt;
use core::ops::Deref;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;

/// A handle borrowed from the pool for the duration of one operation.
///
/// Holds one permit of the resource's guard. The permit is returned exactly
/// once when the checkout is dropped, whether the operation finished, failed
/// or was cancelled.
///
/// ```ignore
/// let model = pool.checkout("gpt-4o").await?;
/// let reply = model.http().post(model.chat_completions_url()).send().await?;
/// // permit released here
/// ```
#[must_use = "a checkout releases its permit as soon as it is dropped"]
pub struct Checkout<H> {
    key: Arc<str>,
    fingerprint: String,
    handle: Arc<H>,
    _permit: OwnedSemaphorePermit,
}

impl<H> Checkout<H> {
    pub(crate) fn new(
        key: &str,
        fingerprint: String,
        handle: Arc<H>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            key: Arc::from(key),
            fingerprint,
            handle,
            _permit: permit,
        }
    }

    /// Key of the checked-out resource.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fingerprint of the configuration the handle was built from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The shared handle, for identity comparisons.
    #[must_use]
    pub fn handle(&self) -> &Arc<H> {
        &self.handle
    }
}

impl<H> Deref for Checkout<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H> fmt::Debug for Checkout<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("key", &self.key)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl<H> Drop for Checkout<H> {
    fn drop(&mut self) {
        tracing::debug!(key = %self.key, "checkout released");
    }
}
