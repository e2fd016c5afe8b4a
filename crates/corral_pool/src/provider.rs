//! Provider table dispatching handle construction by provider identifier.

use crate::config::ResourceConfig;
use crate::error::FactoryError;
use crate::factory::ResourceFactory;
use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::Arc;

/// A single provider able to build handles for configs naming it.
///
/// Adding a provider means registering one more implementation with a
/// [`ProviderTable`]; nothing else changes.
#[async_trait]
pub trait ProviderFactory<C, H>: Send + Sync + 'static
where
    C: ResourceConfig,
    H: Send + Sync + 'static,
{
    /// Builds a handle for `config`.
    async fn build(&self, config: &C) -> Result<H, FactoryError>;

    /// Releases resources held by a detached handle.
    async fn teardown(&self, _config: &C, _handle: &H) {}
}

/// Table of providers keyed by identifier, usable as a [`ResourceFactory`].
///
/// ```
/// # use corral_pool::{ProviderFactory, ProviderTable, ResourceConfig, FactoryError};
/// # use async_trait::async_trait;
/// # use std::sync::Arc;
/// # #[derive(Clone)]
/// # struct Config { key: String, provider: String }
/// # impl ResourceConfig for Config {
/// #     fn key(&self) -> &str { &self.key }
/// #     fn provider(&self) -> &str { &self.provider }
/// #     fn fingerprint(&self) -> String { String::new() }
/// # }
/// struct Echo;
///
/// #[async_trait]
/// impl ProviderFactory<Config, String> for Echo {
///     async fn build(&self, config: &Config) -> Result<String, FactoryError> {
///         Ok(config.key.clone())
///     }
/// }
///
/// let mut table = ProviderTable::<Config, String>::new();
/// table.register("echo", Arc::new(Echo));
/// assert!(table.has_provider("echo"));
/// ```
pub struct ProviderTable<C, H>
where
    C: ResourceConfig,
    H: Send + Sync + 'static,
{
    providers: HashMap<String, Arc<dyn ProviderFactory<C, H>>>,
}

impl<C, H> Default for ProviderTable<C, H>
where
    C: ResourceConfig,
    H: Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }
}

impl<C, H> core::fmt::Debug for ProviderTable<C, H>
where
    C: ResourceConfig,
    H: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProviderTable")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C, H> ProviderTable<C, H>
where
    C: ResourceConfig,
    H: Send + Sync + 'static,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider.
    ///
    /// # Panics
    ///
    /// Panics if a provider with the same name is already registered.
    pub fn register<P: ProviderFactory<C, H>>(&mut self, name: impl Into<String>, provider: Arc<P>) {
        let name = name.into();
        assert!(
            !self.providers.contains_key(&name),
            "provider '{name}' is already registered"
        );
        self.providers
            .insert(name, provider as Arc<dyn ProviderFactory<C, H>>);
    }

    /// Registers a provider, returning the table for chaining.
    ///
    /// # Panics
    ///
    /// Panics if a provider with the same name is already registered.
    #[must_use]
    pub fn with<P: ProviderFactory<C, H>>(mut self, name: impl Into<String>, provider: P) -> Self {
        self.register(name, Arc::new(provider));
        self
    }

    /// Checks if a provider is registered.
    #[must_use]
    pub fn has_provider(&self, name: impl AsRef<str>) -> bool {
        self.providers.contains_key(name.as_ref())
    }

    /// Lists registered provider names, sorted.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    fn provider_for(&self, config: &C) -> Result<&Arc<dyn ProviderFactory<C, H>>, FactoryError> {
        self.providers
            .get(config.provider())
            .ok_or_else(|| FactoryError::UnknownProvider(config.provider().to_string()))
    }
}

#[async_trait]
impl<C, H> ResourceFactory for ProviderTable<C, H>
where
    C: ResourceConfig,
    H: Send + Sync + 'static,
{
    type Config = C;
    type Handle = H;

    async fn build(&self, config: &C) -> Result<H, FactoryError> {
        self.provider_for(config)?.build(config).await
    }

    async fn teardown(&self, config: &C, handle: &H) {
        if let Ok(provider) = self.provider_for(config) {
            provider.teardown(config, handle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Config {
        provider: &'static str,
    }

    impl ResourceConfig for Config {
        fn key(&self) -> &str {
            "k"
        }
        fn provider(&self) -> &str {
            self.provider
        }
        fn fingerprint(&self) -> String {
            String::new()
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl ProviderFactory<Config, &'static str> for Fixed {
        async fn build(&self, _config: &Config) -> Result<&'static str, FactoryError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn dispatches_on_provider_identifier() {
        let table = ProviderTable::<Config, &'static str>::new()
            .with("a", Fixed("built-a"))
            .with("b", Fixed("built-b"));

        assert_eq!(table.build(&Config { provider: "a" }).await.unwrap(), "built-a");
        assert_eq!(table.build(&Config { provider: "b" }).await.unwrap(), "built-b");
        assert_eq!(table.provider_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unknown_provider_is_an_error() {
        let table = ProviderTable::<Config, &'static str>::new().with("a", Fixed("built-a"));

        let err = table.build(&Config { provider: "zzz" }).await.unwrap_err();
        assert!(matches!(err, FactoryError::UnknownProvider(name) if name == "zzz"));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let _ = ProviderTable::<Config, &'static str>::new()
            .with("a", Fixed("x"))
            .with("a", Fixed("y"));
    }
}
