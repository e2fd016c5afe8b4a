//! # Corral Internal Library
//!
//! Re-exports the core Corral crates for convenience.

/// Generic keyed pool of concurrency-limited handles.
pub use corral_pool;

/// Pooled model clients.
pub use corral_models;

/// Pooled bots.
pub use corral_bots;

/// Tracing setup.
pub use corral_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use corral_bots::{BotPool, BotRecord, StandardBot, StandardBotProvider, bot_factory};
    pub use corral_core::{TracingConfig, TracingFormat};
    pub use corral_models::{ModelClient, ModelConfig, ModelPool, model_factory};
    pub use corral_pool::{
        CancellationToken, Checkout, ConfigSource, JsonFileSource, PoolCell, PoolError,
        PoolSettings, RefreshOutcome, RefreshReport, ResourceConfig, ResourceFactory,
        ResourcePool, ResourceStatus, StaticSource,
    };
}
