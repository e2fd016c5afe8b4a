//! Error types for the resource pool.

use core::time::Duration;

/// Errors returned by pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool was used before [`PoolCell::initialize`](crate::PoolCell::initialize) completed.
    #[error("pool not initialized: call initialize() first")]
    NotInitialized,

    /// No resource with this key exists in the pool or the configuration source.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The factory failed to build a handle for a resource.
    #[error("failed to build resource '{key}': {source}")]
    Factory {
        /// Key of the resource being built.
        key: String,
        /// The underlying factory error.
        #[source]
        source: FactoryError,
    },

    /// The configuration source could not be queried.
    #[error("configuration source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// Initialization could not load the active configurations.
    #[error("pool initialization failed: {0}")]
    Initialization(#[source] SourceError),

    /// The wait was cancelled by its caller.
    #[error("operation cancelled")]
    Cancelled,

    /// No permit became available within the configured acquire timeout.
    #[error("timed out after {timeout:?} waiting for a permit on '{key}'")]
    AcquireTimeout {
        /// Key of the resource.
        key: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// In-flight operations did not finish within the configured drain timeout.
    #[error("timed out after {timeout:?} draining '{key}'")]
    DrainTimeout {
        /// Key of the resource.
        key: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl PoolError {
    /// Creates a [`ResourceNotFound`](Self::ResourceNotFound).
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::ResourceNotFound(key.into())
    }

    pub(crate) fn factory(key: impl Into<String>, source: FactoryError) -> Self {
        Self::Factory {
            key: key.into(),
            source,
        }
    }
}

/// Errors raised by a [`ResourceFactory`](crate::ResourceFactory) while building a handle.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// No provider is registered under this identifier.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The configuration cannot produce a handle.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The backend rejected or failed the construction.
    #[error("backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
        /// The underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FactoryError {
    /// Creates an [`InvalidConfig`](Self::InvalidConfig).
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a [`Backend`](Self::Backend) error wrapping `source`.
    pub fn backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors raised by a [`ConfigSource`](crate::ConfigSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source could not be reached.
    #[error("{0}")]
    Unavailable(String),

    /// Reading the backing store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store holds malformed records.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SourceError {
    /// Creates an [`Unavailable`](Self::Unavailable).
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
