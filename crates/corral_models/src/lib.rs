//! Pooled chat-model clients for Corral.
//!
//! Each model deployment ([`ModelConfig`]) becomes one long-lived
//! [`ModelClient`] inside a [`ModelPool`], keyed by deploy name.
//!
//! # Example
//!
//! ```ignore
//! use corral_models::{ModelConfig, ModelPool, model_factory};
//! use corral_pool::{JsonFileSource, PoolSettings};
//! use std::sync::Arc;
//!
//! let source = Arc::new(JsonFileSource::new("models.json"));
//! let models = ModelPool::initialize(model_factory(), source, PoolSettings::from_env()?).await?;
//!
//! let gpt = models.checkout("openai-gpt-4o").await?;
//! let response = gpt.http().post(gpt.chat_completions_url()).json(&body).send().await?;
//! ```

mod client;
mod config;
mod providers;

pub use client::{
    DEFAULT_MAX_RETRIES, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT, Dialect, ModelClient,
    ModelClientBuilder,
};
pub use config::ModelConfig;
pub use providers::{
    AZURE_OPENAI, AzureOpenAiProvider, ModelFactory, OPENAI, OPENAI_BASE_URL, OpenAiProvider,
    model_factory,
};

/// Pool of model clients keyed by deploy name.
pub type ModelPool = corral_pool::ResourcePool<ModelFactory>;
