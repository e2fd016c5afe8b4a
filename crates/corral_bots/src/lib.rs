//! Pooled chat bots for Corral.
//!
//! A [`BotRecord`] describes a bot: which model deployment it talks to, its
//! system prompt, and how much conversation it remembers. The `standard`
//! provider turns a record into a [`StandardBot`] with a model client of its
//! own, and a [`BotPool`] keeps one per bot id.
//!
//! # Example
//!
//! ```ignore
//! use corral_bots::{BotPool, JsonPromptFile, StandardBotProvider, bot_factory};
//! use corral_models::model_factory;
//! use corral_pool::{JsonFileSource, PoolSettings};
//! use std::sync::Arc;
//!
//! let provider = StandardBotProvider::new(
//!     Arc::new(JsonFileSource::new("models.json")),
//!     Arc::new(JsonPromptFile::new("prompts.json")),
//!     Arc::new(model_factory()),
//! );
//! let bots = BotPool::initialize(
//!     bot_factory(provider),
//!     Arc::new(JsonFileSource::new("bots.json")),
//!     PoolSettings::from_env()?,
//! )
//! .await?;
//!
//! let bot = bots.checkout("42").await?;
//! let history = bot.memory().window(&messages);
//! ```

mod bot;
mod memory;
mod prompt;
mod record;

pub use bot::{BotFactory, BotProfile, STANDARD, StandardBot, StandardBotProvider, bot_factory};
pub use memory::{DEFAULT_MESSAGE_ROUNDS, MemoryPolicy};
pub use prompt::{JsonPromptFile, PromptSource, StaticPrompts};
pub use record::{BotProperties, BotRecord};

/// Pool of bots keyed by bot id.
pub type BotPool = corral_pool::ResourcePool<BotFactory>;
