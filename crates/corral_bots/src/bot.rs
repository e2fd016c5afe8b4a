//! Standard bots and the provider that builds them.

use crate::memory::MemoryPolicy;
use crate::prompt::PromptSource;
use crate::record::BotRecord;
use async_trait::async_trait;
use corral_models::{ModelClient, ModelConfig, ModelFactory};
use corral_pool::{ConfigSource, FactoryError, ProviderFactory, ProviderTable, ResourceFactory};
use std::sync::Arc;

/// Bot type served by [`StandardBotProvider`].
pub const STANDARD: &str = "standard";

/// Builds bot handles dispatched by [`BotRecord::bot_type`].
pub type BotFactory = ProviderTable<BotRecord, StandardBot>;

/// Returns a factory with the `standard` provider registered.
#[must_use]
pub fn bot_factory(provider: StandardBotProvider) -> BotFactory {
    BotFactory::new().with(STANDARD, provider)
}

/// Identity of a built bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotProfile {
    /// Bot id.
    pub id: String,
    /// Business code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Deploy name of the model behind the bot.
    pub deploy_name: String,
    /// Provider of that model.
    pub model_provider: String,
}

/// A ready-to-use bot: its own model client, system prompt and memory policy.
#[derive(Debug)]
pub struct StandardBot {
    profile: BotProfile,
    model: ModelClient,
    prompt_template: String,
    memory: MemoryPolicy,
}

impl StandardBot {
    /// Who this bot is.
    #[must_use]
    pub fn profile(&self) -> &BotProfile {
        &self.profile
    }

    /// The bot's dedicated model client.
    #[must_use]
    pub fn model(&self) -> &ModelClient {
        &self.model
    }

    /// System prompt template; empty when the bot has none.
    #[must_use]
    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    /// Conversation memory policy.
    #[must_use]
    pub fn memory(&self) -> MemoryPolicy {
        self.memory
    }
}

/// Builds [`StandardBot`]s.
///
/// Resolves the bot's model through the model registry and its system
/// prompt through a [`PromptSource`], then builds a model client of its own.
pub struct StandardBotProvider {
    models: Arc<dyn ConfigSource<ModelConfig>>,
    prompts: Arc<dyn PromptSource>,
    model_factory: Arc<ModelFactory>,
}

impl core::fmt::Debug for StandardBotProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StandardBotProvider")
            .field("model_factory", &self.model_factory)
            .finish_non_exhaustive()
    }
}

impl StandardBotProvider {
    /// Creates a provider resolving models from `models` and prompts from `prompts`.
    #[must_use]
    pub fn new(
        models: Arc<dyn ConfigSource<ModelConfig>>,
        prompts: Arc<dyn PromptSource>,
        model_factory: Arc<ModelFactory>,
    ) -> Self {
        Self {
            models,
            prompts,
            model_factory,
        }
    }

    fn resolve_model(&self, record: &BotRecord) -> Result<ModelConfig, FactoryError> {
        let deploy_name = record
            .properties
            .models_deploy_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                FactoryError::invalid_config(format!("bot '{}' has no deploy name", record.code))
            })?;

        self.models
            .get_by_key(deploy_name)
            .map_err(|err| FactoryError::backend("model registry unavailable", err))?
            .ok_or_else(|| {
                FactoryError::invalid_config(format!(
                    "bot '{}' uses unknown or inactive model '{deploy_name}'",
                    record.code
                ))
            })
    }

    fn resolve_prompt(&self, record: &BotRecord) -> Result<String, FactoryError> {
        let Some(code) = record.properties.models_prompt_code.as_deref() else {
            return Ok(String::new());
        };
        let content = self
            .prompts
            .content(code)
            .map_err(|err| FactoryError::backend("prompt source unavailable", err))?;
        if content.is_none() {
            tracing::warn!(
                bot = %record.code,
                prompt = code,
                "prompt not found, using empty template"
            );
        }
        Ok(content.unwrap_or_default())
    }
}

#[async_trait]
impl ProviderFactory<BotRecord, StandardBot> for StandardBotProvider {
    async fn build(&self, record: &BotRecord) -> Result<StandardBot, FactoryError> {
        let memory = MemoryPolicy::from_properties(&record.properties)?;
        let model_config = self.resolve_model(record)?;
        let prompt_template = self.resolve_prompt(record)?;
        let model = self.model_factory.build(&model_config).await?;

        tracing::debug!(
            bot = %record.code,
            deploy_name = %model_config.deploy_name,
            ?memory,
            "standard bot built"
        );
        Ok(StandardBot {
            profile: BotProfile {
                id: record.id.clone(),
                code: record.code.clone(),
                name: record.name.clone(),
                deploy_name: model_config.deploy_name,
                model_provider: model_config.provider,
            },
            model,
            prompt_template,
            memory,
        })
    }

    async fn teardown(&self, record: &BotRecord, bot: &StandardBot) {
        tracing::debug!(
            bot = %record.code,
            deploy_name = %bot.profile.deploy_name,
            "standard bot released"
        );
    }
}
