//! Prompt template lookup.

use corral_pool::SourceError;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::path::PathBuf;

/// Read-only lookup of prompt template content by prompt code.
pub trait PromptSource: Send + Sync + 'static {
    /// Returns the template content for `code`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the source cannot be queried.
    fn content(&self, code: &str) -> Result<Option<String>, SourceError>;
}

/// In-memory prompt templates.
#[derive(Debug, Default)]
pub struct StaticPrompts {
    prompts: RwLock<HashMap<String, String>>,
}

impl StaticPrompts {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template, returning `self` for chaining.
    #[must_use]
    pub fn with(self, code: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(code, content);
        self
    }

    /// Adds or replaces a template.
    pub fn insert(&self, code: impl Into<String>, content: impl Into<String>) {
        self.prompts.write().insert(code.into(), content.into());
    }
}

impl PromptSource for StaticPrompts {
    fn content(&self, code: &str) -> Result<Option<String>, SourceError> {
        Ok(self.prompts.read().get(code).cloned())
    }
}

/// Prompt templates read from a JSON object of `code → content` on disk.
///
/// The file is re-read on every lookup.
#[derive(Debug, Clone)]
pub struct JsonPromptFile {
    path: PathBuf,
}

impl JsonPromptFile {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PromptSource for JsonPromptFile {
    fn content(&self, code: &str) -> Result<Option<String>, SourceError> {
        let bytes = std::fs::read(&self.path)?;
        let mut prompts: HashMap<String, String> = serde_json::from_slice(&bytes)?;
        Ok(prompts.remove(code))
    }
}
