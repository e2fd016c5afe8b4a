//! Model deployment records.

use corral_pool::{FactoryError, ResourceConfig, digest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One model deployment, as stored by the model registry.
///
/// ```
/// # use corral_models::ModelConfig;
/// let config: ModelConfig = serde_json::from_str(r#"{
///     "deploy_name": "openai-gpt-4o",
///     "name": "GPT-4o",
///     "provider": "openai",
///     "properties": { "api_key": "sk-test", "model": "gpt-4o" }
/// }"#).unwrap();
///
/// assert!(config.is_active);
/// assert_eq!(config.property("model"), Some("gpt-4o"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Deployment name; the pool key.
    pub deploy_name: String,
    /// Display name.
    pub name: String,
    /// Provider identifier, e.g. `"openai"` or `"azure_openai"`.
    pub provider: String,
    /// Provider-specific connection properties.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Inactive deployments are never pooled.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Explicit version; when absent the fingerprint is derived from the record.
    #[serde(default)]
    pub version: Option<String>,
    /// Per-deployment concurrency limit.
    #[serde(default)]
    pub concurrency_limit: Option<usize>,
}

fn default_active() -> bool {
    true
}

impl ModelConfig {
    /// Creates an active config with no properties.
    pub fn new(
        deploy_name: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            deploy_name: deploy_name.into(),
            name: name.into(),
            provider: provider.into(),
            properties: Map::new(),
            is_active: true,
            version: None,
            concurrency_limit: None,
        }
    }

    /// Sets a string property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Sets the explicit version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Returns a non-empty string property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns a string property, or an [`FactoryError::InvalidConfig`] naming it.
    ///
    /// # Errors
    ///
    /// Fails if the property is missing, empty, or not a string.
    pub fn require(&self, name: &str) -> Result<&str, FactoryError> {
        self.property(name).ok_or_else(|| {
            FactoryError::invalid_config(format!(
                "model '{}' is missing property '{name}'",
                self.deploy_name
            ))
        })
    }

    /// Returns a numeric property.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.properties.get(name).and_then(Value::as_f64)
    }
}

impl ResourceConfig for ModelConfig {
    fn key(&self) -> &str {
        &self.deploy_name
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn fingerprint(&self) -> String {
        match &self.version {
            Some(version) => version.clone(),
            None => {
                let properties = Value::Object(self.properties.clone()).to_string();
                digest([self.name.as_str(), self.provider.as_str(), &properties])
            }
        }
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
