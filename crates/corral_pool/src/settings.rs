//! Pool-wide settings.

use core::time::Duration;

/// Concurrency limit used when a config does not specify one.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Environment variable overriding [`PoolSettings::default_concurrency`].
pub const ENV_DEFAULT_CONCURRENCY: &str = "CORRAL_DEFAULT_CONCURRENCY";
/// Environment variable setting [`PoolSettings::acquire_timeout`], in milliseconds.
pub const ENV_ACQUIRE_TIMEOUT_MS: &str = "CORRAL_ACQUIRE_TIMEOUT_MS";
/// Environment variable setting [`PoolSettings::drain_timeout`], in milliseconds.
pub const ENV_DRAIN_TIMEOUT_MS: &str = "CORRAL_DRAIN_TIMEOUT_MS";

/// Error parsing settings from the environment.
#[derive(Debug, thiserror::Error)]
#[error("invalid value '{value}' for {var}: {reason}")]
pub struct SettingsError {
    /// Variable name.
    pub var: &'static str,
    /// Offending value.
    pub value: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// Settings shared by every slot of a pool.
///
/// ```
/// use core::time::Duration;
/// use corral_pool::PoolSettings;
///
/// let settings = PoolSettings::default()
///     .with_default_concurrency(8)
///     .with_acquire_timeout(Duration::from_secs(30));
/// assert_eq!(settings.default_concurrency, 8);
/// assert!(settings.drain_timeout.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Permits per resource when its config does not set a limit.
    pub default_concurrency: usize,
    /// Upper bound on a checkout's wait for a permit. `None` waits until cancelled.
    pub acquire_timeout: Option<Duration>,
    /// Upper bound on a refresh's wait for in-flight work. `None` waits until cancelled.
    pub drain_timeout: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            default_concurrency: DEFAULT_CONCURRENCY,
            acquire_timeout: None,
            drain_timeout: None,
        }
    }
}

impl PoolSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default per-resource concurrency limit.
    #[must_use]
    pub fn with_default_concurrency(mut self, limit: usize) -> Self {
        self.default_concurrency = limit;
        self
    }

    /// Sets the checkout acquire timeout.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Sets the drain timeout used by refresh and removal.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if a variable is set to a malformed value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`, starting from the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if a variable is set to a malformed value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(value) = lookup(ENV_DEFAULT_CONCURRENCY) {
            let limit = parse_number(ENV_DEFAULT_CONCURRENCY, &value)?;
            if limit == 0 {
                return Err(SettingsError {
                    var: ENV_DEFAULT_CONCURRENCY,
                    value,
                    reason: "must be at least 1",
                });
            }
            settings.default_concurrency = usize::try_from(limit).map_err(|_| SettingsError {
                var: ENV_DEFAULT_CONCURRENCY,
                value: limit.to_string(),
                reason: "out of range",
            })?;
        }
        if let Some(value) = lookup(ENV_ACQUIRE_TIMEOUT_MS) {
            let millis = parse_number(ENV_ACQUIRE_TIMEOUT_MS, &value)?;
            settings.acquire_timeout = Some(Duration::from_millis(millis));
        }
        if let Some(value) = lookup(ENV_DRAIN_TIMEOUT_MS) {
            let millis = parse_number(ENV_DRAIN_TIMEOUT_MS, &value)?;
            settings.drain_timeout = Some(Duration::from_millis(millis));
        }

        Ok(settings)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError {
        var,
        value: value.to_string(),
        reason: "expected a non-negative integer",
    })
}
