//! Core infrastructure shared by Corral binaries.
//!
//! Currently this is the tracing subscriber setup, [`TracingConfig`].

mod tracing_config;

pub use tracing_config::{LOG_ENV, LOG_FORMAT_ENV, TracingConfig, TracingFormat};
