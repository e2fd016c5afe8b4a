//! Conversation memory policies.

use crate::record::BotProperties;
use corral_pool::FactoryError;

/// Rounds kept by the `"messages"` strategy when none is configured.
pub const DEFAULT_MESSAGE_ROUNDS: usize = 10;

/// How much conversation history a bot keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPolicy {
    /// No history; every exchange starts fresh.
    Disabled,
    /// Full history, untrimmed.
    Unbounded,
    /// History trimmed from the front to fit a token budget.
    Tokens(usize),
    /// The most recent `n` question/answer rounds.
    Rounds(usize),
}

impl MemoryPolicy {
    /// Derives the policy from a bot's properties.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidConfig`] for an unknown strategy or a
    /// `"tokens"` strategy without `max_tokens`.
    pub fn from_properties(properties: &BotProperties) -> Result<Self, FactoryError> {
        if !properties.memory_enable {
            return Ok(Self::Disabled);
        }
        match properties.memory_strategy.as_deref() {
            None | Some("") => Ok(Self::Unbounded),
            Some("tokens") => properties.max_tokens.map(Self::Tokens).ok_or_else(|| {
                FactoryError::invalid_config("memory strategy 'tokens' requires max_tokens")
            }),
            Some("messages") => Ok(Self::Rounds(
                properties
                    .max_message_rounds
                    .unwrap_or(DEFAULT_MESSAGE_ROUNDS),
            )),
            Some(other) => Err(FactoryError::invalid_config(format!(
                "unknown memory strategy '{other}'"
            ))),
        }
    }

    /// Whether history is kept at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// The tail of `history` this policy keeps for the next call.
    ///
    /// `history` excludes the system prompt. Each round is one question and
    /// one answer. Token budgets are enforced by the model call, so
    /// [`Tokens`](Self::Tokens) keeps everything here.
    #[must_use]
    pub fn window<'a, T>(&self, history: &'a [T]) -> &'a [T] {
        match self {
            Self::Disabled => &[],
            Self::Unbounded | Self::Tokens(_) => history,
            Self::Rounds(rounds) => {
                let keep = rounds.saturating_mul(2);
                &history[history.len().saturating_sub(keep)..]
            }
        }
    }
}
