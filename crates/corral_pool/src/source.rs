//! Configuration sources: where the pool learns which resources should exist.

use crate::config::ResourceConfig;
use crate::error::SourceError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Read-only source of truth for resource configurations.
///
/// Inactive configs must not be returned by either method.
pub trait ConfigSource<C: ResourceConfig>: Send + Sync + 'static {
    /// Lists every active configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source cannot be queried.
    fn list_active(&self) -> Result<Vec<C>, SourceError>;

    /// Looks up the active configuration for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source cannot be queried.
    fn get_by_key(&self, key: &str) -> Result<Option<C>, SourceError>;
}

/// In-memory configuration source that can be edited at runtime.
#[derive(Debug)]
pub struct StaticSource<C> {
    configs: RwLock<Vec<C>>,
    available: RwLock<bool>,
}

impl<C: ResourceConfig> Default for StaticSource<C> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<C: ResourceConfig> StaticSource<C> {
    /// Creates a source holding `configs`.
    #[must_use]
    pub fn new(configs: Vec<C>) -> Self {
        Self {
            configs: RwLock::new(configs),
            available: RwLock::new(true),
        }
    }

    /// Replaces every configuration.
    pub fn replace_all(&self, configs: Vec<C>) {
        *self.configs.write() = configs;
    }

    /// Inserts `config`, replacing any config with the same key.
    pub fn upsert(&self, config: C) {
        let mut configs = self.configs.write();
        match configs.iter_mut().find(|c| c.key() == config.key()) {
            Some(existing) => *existing = config,
            None => configs.push(config),
        }
    }

    /// Removes the config for `key`, returning it.
    pub fn remove(&self, key: &str) -> Option<C> {
        let mut configs = self.configs.write();
        let index = configs.iter().position(|c| c.key() == key)?;
        Some(configs.remove(index))
    }

    /// Toggles availability; while unavailable every query fails.
    pub fn set_available(&self, available: bool) {
        *self.available.write() = available;
    }

    fn check(&self) -> Result<(), SourceError> {
        if *self.available.read() {
            Ok(())
        } else {
            Err(SourceError::unavailable("static source marked unavailable"))
        }
    }
}

impl<C: ResourceConfig> ConfigSource<C> for StaticSource<C> {
    fn list_active(&self) -> Result<Vec<C>, SourceError> {
        self.check()?;
        Ok(self
            .configs
            .read()
            .iter()
            .filter(|c| c.is_active())
            .cloned()
            .collect())
    }

    fn get_by_key(&self, key: &str) -> Result<Option<C>, SourceError> {
        self.check()?;
        Ok(self
            .configs
            .read()
            .iter()
            .find(|c| c.key() == key && c.is_active())
            .cloned())
    }
}

/// Source backed by a JSON array of configurations on disk.
///
/// The file is re-read on every query, so edits are seen by the next refresh.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load<C: ResourceConfig + DeserializeOwned>(&self) -> Result<Vec<C>, SourceError> {
        let bytes = std::fs::read(&self.path)?;
        let configs: Vec<C> = serde_json::from_slice(&bytes)?;
        Ok(configs.into_iter().filter(ResourceConfig::is_active).collect())
    }
}

impl<C: ResourceConfig + DeserializeOwned> ConfigSource<C> for JsonFileSource {
    fn list_active(&self) -> Result<Vec<C>, SourceError> {
        self.load()
    }

    fn get_by_key(&self, key: &str) -> Result<Option<C>, SourceError> {
        Ok(self.load::<C>()?.into_iter().find(|c| c.key() == key))
    }
}
