//! Bot definition records.

use corral_pool::{ResourceConfig, digest};
use serde::{Deserialize, Serialize};

/// One bot definition, as stored by the bot registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRecord {
    /// Unique id; the pool key.
    pub id: String,
    /// Stable business code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Bot type; selects the provider (e.g. `"standard"`).
    pub bot_type: String,
    /// Behavior settings.
    #[serde(default)]
    pub properties: BotProperties,
    /// Inactive bots are never pooled.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Explicit version; when absent the fingerprint is derived from the record.
    #[serde(default)]
    pub version: Option<String>,
    /// Per-bot concurrency limit.
    #[serde(default)]
    pub concurrency_limit: Option<usize>,
}

fn default_active() -> bool {
    true
}

/// Behavior settings of a [`BotRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProperties {
    /// Deploy name of the model the bot talks to.
    #[serde(default)]
    pub models_deploy_name: Option<String>,
    /// Code of the system prompt.
    #[serde(default)]
    pub models_prompt_code: Option<String>,
    /// Whether conversation history is kept.
    #[serde(default)]
    pub memory_enable: bool,
    /// `"tokens"` or `"messages"`.
    #[serde(default)]
    pub memory_strategy: Option<String>,
    /// Token budget for the `"tokens"` strategy.
    #[serde(default)]
    pub max_tokens: Option<usize>,
    /// Conversation rounds kept by the `"messages"` strategy.
    #[serde(default)]
    pub max_message_rounds: Option<usize>,
}

impl BotRecord {
    /// Creates an active record with default properties.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        bot_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            bot_type: bot_type.into(),
            properties: BotProperties::default(),
            is_active: true,
            version: None,
            concurrency_limit: None,
        }
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_properties(mut self, properties: BotProperties) -> Self {
        self.properties = properties;
        self
    }
}

impl ResourceConfig for BotRecord {
    fn key(&self) -> &str {
        &self.id
    }

    fn provider(&self) -> &str {
        &self.bot_type
    }

    fn fingerprint(&self) -> String {
        if let Some(version) = &self.version {
            return version.clone();
        }
        let properties = serde_json::to_string(&self.properties).unwrap_or_default();
        digest([self.code.as_str(), self.name.as_str(), &properties])
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn concurrency_limit(&self) -> Option<usize> {
        self.concurrency_limit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_stored_properties() {
        let record: BotRecord = serde_json::from_str(
            r#"{
                "id": "42",
                "code": "support",
                "name": "Support",
                "bot_type": "standard",
                "properties": {
                    "max_tokens": 333,
                    "memory_enable": true,
                    "memory_strategy": "tokens",
                    "max_message_rounds": null,
                    "models_deploy_name": "openai-gpt-4o",
                    "models_prompt_code": "prompt-20241126174648-EqSH"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(record.key(), "42");
        assert_eq!(record.provider(), "standard");
        assert!(record.is_active);
        assert_eq!(record.properties.max_tokens, Some(333));
        assert_eq!(record.properties.max_message_rounds, None);
    }

    #[test]
    fn fingerprint_tracks_code_name_and_properties() {
        let base = BotRecord::new("1", "c", "n", "standard");
        let fingerprint = base.fingerprint();

        let mut renamed = base.clone();
        renamed.name = "other".into();
        let mut tuned = base.clone();
        tuned.properties.memory_enable = true;
        let mut limited = base.clone();
        limited.concurrency_limit = Some(1);

        assert_ne!(renamed.fingerprint(), fingerprint);
        assert_ne!(tuned.fingerprint(), fingerprint);
        assert_eq!(limited.fingerprint(), fingerprint);

        limited.version = Some("3".into());
        assert_eq!(limited.fingerprint(), "3");
    }
}
