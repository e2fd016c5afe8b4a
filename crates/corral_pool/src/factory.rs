//! The [`ResourceFactory`] trait for building pooled handles.

use crate::config::ResourceConfig;
use crate::error::FactoryError;
use async_trait::async_trait;

/// Builds ready-to-use handles from resource configurations.
///
/// Construction may perform network setup and is allowed to fail. The pool
/// never holds its registry lock while calling [`build`](Self::build).
#[async_trait]
pub trait ResourceFactory: Send + Sync + 'static {
    /// Configuration type consumed by the factory.
    type Config: ResourceConfig;

    /// Handle type produced by the factory.
    type Handle: Send + Sync + 'static;

    /// Builds a handle for `config`.
    async fn build(&self, config: &Self::Config) -> Result<Self::Handle, FactoryError>;

    /// Releases resources held by a handle that has been detached from the pool.
    ///
    /// `config` is the configuration the handle was built from. Called once the
    /// handle's guard has drained, so no checkout is using it.
    async fn teardown(&self, _config: &Self::Config, _handle: &Self::Handle) {}
}
