//! Built-in model providers.

use crate::client::{
    DEFAULT_MAX_RETRIES, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT, Dialect, ModelClient,
    ModelClientBuilder,
};
use crate::config::ModelConfig;
use async_trait::async_trait;
use core::time::Duration;
use corral_pool::{FactoryError, ProviderFactory, ProviderTable};

/// Provider identifier for OpenAI-compatible endpoints.
pub const OPENAI: &str = "openai";

/// Provider identifier for Azure OpenAI deployments.
pub const AZURE_OPENAI: &str = "azure_openai";

/// Base URL used when an `openai` deployment sets no `base_url`.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Builds [`ModelClient`]s dispatched by [`ModelConfig::provider`].
pub type ModelFactory = ProviderTable<ModelConfig, ModelClient>;

/// Returns a factory with the `openai` and `azure_openai` providers registered.
#[must_use]
pub fn model_factory() -> ModelFactory {
    ModelFactory::new()
        .with(OPENAI, OpenAiProvider)
        .with(AZURE_OPENAI, AzureOpenAiProvider)
}

/// OpenAI and OpenAI-compatible endpoints.
///
/// Properties: `api_key` (required), `base_url`, `model` (defaults to the
/// deploy name), `timeout_secs`, `temperature`, `max_retries`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiProvider;

#[async_trait]
impl ProviderFactory<ModelConfig, ModelClient> for OpenAiProvider {
    async fn build(&self, config: &ModelConfig) -> Result<ModelClient, FactoryError> {
        let api_key = config.require("api_key")?;
        let base_url = config.property("base_url").unwrap_or(OPENAI_BASE_URL);
        let model = config.property("model").unwrap_or(&config.deploy_name);

        let client = tuned(config, ModelClientBuilder::new(Dialect::OpenAi, base_url, model))
            .api_key(Some(api_key))
            .build()?;
        tracing::debug!(
            deploy_name = %config.deploy_name,
            url = %client.chat_completions_url(),
            "openai client built"
        );
        Ok(client)
    }
}

/// Azure OpenAI deployments.
///
/// Properties: `endpoint`, `deployment_name`, `openai_api_version` (all
/// required), `api_key`, `timeout_secs`, `temperature`, `max_retries`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AzureOpenAiProvider;

#[async_trait]
impl ProviderFactory<ModelConfig, ModelClient> for AzureOpenAiProvider {
    async fn build(&self, config: &ModelConfig) -> Result<ModelClient, FactoryError> {
        let endpoint = config.require("endpoint")?;
        let deployment = config.require("deployment_name")?;
        let dialect = Dialect::AzureOpenAi {
            api_version: config.require("openai_api_version")?.to_string(),
        };

        let client = tuned(config, ModelClientBuilder::new(dialect, endpoint, deployment))
            .api_key(config.property("api_key"))
            .build()?;
        tracing::debug!(
            deploy_name = %config.deploy_name,
            url = %client.chat_completions_url(),
            "azure client built"
        );
        Ok(client)
    }
}

/// Applies the optional tuning properties shared by every provider.
fn tuned(config: &ModelConfig, builder: ModelClientBuilder) -> ModelClientBuilder {
    let timeout = config
        .number("timeout_secs")
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(DEFAULT_TIMEOUT);
    let max_retries = config
        .properties
        .get("max_retries")
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(DEFAULT_MAX_RETRIES);

    builder
        .timeout(timeout)
        .temperature(config.number("temperature").unwrap_or(DEFAULT_TEMPERATURE))
        .max_retries(max_retries)
}
