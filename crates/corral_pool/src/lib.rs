//! Keyed pool of long-lived, concurrency-limited resource handles.
//!
//! A [`ResourcePool`] owns one [`ResourceSlot`] per resource key. Each slot
//! holds a handle built by a [`ResourceFactory`], the configuration it was
//! built from, and a [`ConcurrencyGuard`] bounding simultaneous use. The set
//! of resources is reconciled against a [`ConfigSource`] on demand.
//!
//! # Overview
//!
//! - Scoped checkouts: [`ResourcePool::checkout`] returns a [`Checkout`] that
//!   releases its permit on drop, on every exit path.
//!
//! - Drain before swap: [`ResourcePool::refresh_one`] and
//!   [`ResourcePool::refresh_all`] wait for in-flight checkouts to finish
//!   before replacing or removing a handle.
//!
//! - Failure isolation: one bad configuration is logged and skipped during
//!   bulk loads; the rest of the pool keeps serving.
//!
//! - Pluggable providers: a [`ProviderTable`] dispatches construction on the
//!   config's provider identifier.
//!
//! # Example
//!
//! ```ignore
//! use corral_pool::{PoolSettings, ResourcePool, StaticSource};
//! use std::sync::Arc;
//!
//! let source = Arc::new(StaticSource::new(configs));
//! let pool = ResourcePool::initialize(factory, source, PoolSettings::default()).await?;
//!
//! let handle = pool.checkout("m1").await?;
//! // ... use the handle; the permit is returned when it drops
//! ```

mod cell;
mod checkout;
mod config;
pub mod error;
mod factory;
mod guard;
mod pool;
mod provider;
mod registry;
pub mod settings;
mod slot;
pub mod source;
mod status;

pub use cell::PoolCell;
pub use checkout::Checkout;
pub use config::{ConfigSummary, ResourceConfig, digest};
pub use error::{FactoryError, PoolError, SourceError};
pub use factory::ResourceFactory;
pub use guard::{ConcurrencyGuard, Drained, MAX_LIMIT};
pub use pool::ResourcePool;
pub use provider::{ProviderFactory, ProviderTable};
pub use settings::{PoolSettings, SettingsError};
pub use slot::ResourceSlot;
pub use source::{ConfigSource, JsonFileSource, StaticSource};
pub use status::{RefreshOutcome, RefreshReport, ResourceStatus};

/// Cancellation token accepted by the `*_with` pool operations.
pub use tokio_util::sync::CancellationToken;
