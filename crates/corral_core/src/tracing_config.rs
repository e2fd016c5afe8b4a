//! Tracing subscriber setup.
//!
//! Provides [`TracingConfig`], which installs a global `tracing` subscriber
//! with an [`EnvFilter`] and one of three output formats.
//!
//! # Example
//!
//! ```no_run
//! use corral_core::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("corral_pool=debug,reqwest=warn")
//!     .init()
//!     .ok();
//!
//! tracing::info!("ready");
//! ```

use core::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable holding a filter directive, e.g. `corral_pool=debug`.
pub const LOG_ENV: &str = "CORRAL_LOG";

/// Environment variable selecting the output format: `pretty`, `compact` or `json`.
pub const LOG_FORMAT_ENV: &str = "CORRAL_LOG_FORMAT";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

impl FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown tracing format '{other}'")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
///
/// ```
/// use corral_core::{TracingConfig, TracingFormat};
/// use tracing::Level;
///
/// // Development: pretty output with span enter/exit
/// let dev = TracingConfig::default()
///     .with_level(Level::DEBUG)
///     .with_span_events(true);
///
/// // Production: JSON for log aggregation
/// let prod = TracingConfig::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("corral_pool=info,reqwest=warn");
/// # let _ = (dev, prod);
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Maximum log level, used when no filter directive is set.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
    /// Filter directive (e.g. `"corral_pool=debug,reqwest=warn"`).
    pub env_filter: Option<String>,
    /// Whether span enter/exit events are emitted.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`LOG_ENV`] and [`LOG_FORMAT_ENV`] over the defaults.
    ///
    /// An unrecognized format falls back to [`TracingFormat::Pretty`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).filter(|f| !f.trim().is_empty()) {
            config.env_filter = Some(filter);
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.format = format.parse().unwrap_or_default();
        }
        config
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a filter directive.
    ///
    /// Format: `target=level,target=level,...`. An invalid directive falls
    /// back to [`level`](Self::level).
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The filter this config installs.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`TryInitError`] if a global subscriber is already installed;
    /// the existing one stays in place.
    pub fn init(&self) -> Result<(), TryInitError> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(self.filter());
        match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<TracingFormat>(), Ok(TracingFormat::Json));
        assert_eq!(" compact ".parse::<TracingFormat>(), Ok(TracingFormat::Compact));
        assert!("xml".parse::<TracingFormat>().is_err());
    }

    #[test]
    fn from_lookup_reads_filter_and_format() {
        let config = TracingConfig::from_lookup(|var| match var {
            LOG_ENV => Some("corral_pool=debug".to_string()),
            LOG_FORMAT_ENV => Some("json".to_string()),
            _ => None,
        });

        assert_eq!(config.env_filter.as_deref(), Some("corral_pool=debug"));
        assert_eq!(config.format, TracingFormat::Json);
        assert_eq!(config.level, Level::INFO);
    }

    #[test]
    fn from_lookup_ignores_blank_and_unknown_values() {
        let config = TracingConfig::from_lookup(|var| match var {
            LOG_ENV => Some("  ".to_string()),
            LOG_FORMAT_ENV => Some("yaml".to_string()),
            _ => None,
        });

        assert!(config.env_filter.is_none());
        assert_eq!(config.format, TracingFormat::Pretty);
    }

    #[test]
    fn invalid_filter_falls_back_to_level() {
        let config = TracingConfig::new()
            .with_level(Level::WARN)
            .with_env_filter("corral=notalevel");

        assert_eq!(config.filter().to_string(), "warn");
    }

    #[test]
    fn second_init_reports_error() {
        let config = TracingConfig::new().with_format(TracingFormat::Compact);

        assert!(config.init().is_ok());
        assert!(config.init().is_err());
    }
}
