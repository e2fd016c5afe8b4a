//! Model and bot pools wired from JSON configuration files.
//!
//! The demo keeps both pools in process-wide [`PoolCell`]s, the way a
//! service would, and exercises the full lifecycle: initialize, status,
//! concurrent checkouts, refresh and cleanup.

use core::sync::atomic::{AtomicUsize, Ordering};
use core::time::Duration;
use corral_bots::{BotFactory, JsonPromptFile, StandardBotProvider, bot_factory};
use corral_models::{ModelConfig, ModelFactory, model_factory};
use corral_pool::{
    ConfigSource, JsonFileSource, PoolCell, PoolError, PoolSettings, RefreshReport,
    ResourcePool, ResourceStatus, SettingsError,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Variable naming the model registry file.
pub const MODELS_FILE_ENV: &str = "CORRAL_MODELS_FILE";
/// Variable naming the bot registry file.
pub const BOTS_FILE_ENV: &str = "CORRAL_BOTS_FILE";
/// Variable naming the prompt file.
pub const PROMPTS_FILE_ENV: &str = "CORRAL_PROMPTS_FILE";

/// Process-wide model pool.
pub static MODELS: PoolCell<ModelFactory> = PoolCell::new();

/// Process-wide bot pool.
pub static BOTS: PoolCell<BotFactory> = PoolCell::new();

/// Errors surfaced by the demo.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Pool settings could not be read from the environment.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// A pool operation failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Status could not be rendered.
    #[error("failed to render status: {0}")]
    Render(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Locations of the three registry files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoPaths {
    /// JSON array of model deployments.
    pub models: PathBuf,
    /// JSON array of bot records.
    pub bots: PathBuf,
    /// JSON object of prompt code to template.
    pub prompts: PathBuf,
}

impl DemoPaths {
    /// Reads the paths from the environment, defaulting to the bundled `config/` files.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");
        let path = |var: &str, file: &str| {
            lookup(var).map_or_else(|| bundled.join(file), PathBuf::from)
        };
        Self {
            models: path(MODELS_FILE_ENV, "models.json"),
            bots: path(BOTS_FILE_ENV, "bots.json"),
            prompts: path(PROMPTS_FILE_ENV, "prompts.json"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Initializes both pools. Models first, since bots resolve through them.
///
/// # Errors
///
/// Fails if either registry file cannot be read.
pub async fn start(paths: &DemoPaths, settings: PoolSettings) -> Result<(), DemoError> {
    let models: Arc<dyn ConfigSource<ModelConfig>> =
        Arc::new(JsonFileSource::new(&paths.models));

    let source = Arc::clone(&models);
    MODELS
        .initialize(|| ResourcePool::initialize(model_factory(), source, settings))
        .await?;

    let provider = StandardBotProvider::new(
        models,
        Arc::new(JsonPromptFile::new(&paths.prompts)),
        Arc::new(model_factory()),
    );
    let bots = Arc::new(JsonFileSource::new(&paths.bots));
    BOTS.initialize(|| ResourcePool::initialize(bot_factory(provider), bots, settings))
        .await?;

    tracing::info!(
        models = MODELS.get()?.len(),
        bots = BOTS.get()?.len(),
        "pools ready"
    );
    Ok(())
}

/// Status of both pools as pretty JSON.
///
/// # Errors
///
/// Fails if the pools are not initialized.
pub fn status_json() -> Result<String, DemoError> {
    #[derive(serde::Serialize)]
    struct Status {
        models: Vec<ResourceStatus>,
        bots: Vec<ResourceStatus>,
    }

    let status = Status {
        models: MODELS.get()?.status(),
        bots: BOTS.get()?.status(),
    };
    Ok(serde_json::to_string_pretty(&status)?)
}

/// Runs `callers` concurrent checkouts of `bot_id`, each holding its bot for `hold`.
///
/// Returns the largest number of callers that held the bot at once, which
/// never exceeds the bot's concurrency limit.
///
/// # Errors
///
/// Fails if the bot pool is not initialized or `bot_id` is unknown.
pub async fn exercise(bot_id: &str, callers: usize, hold: Duration) -> Result<usize, DemoError> {
    let pool = BOTS.get()?;
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let calls = (0..callers).map(|caller| {
        let pool = Arc::clone(&pool);
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        async move {
            let bot = pool.checkout(bot_id).await?;
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tracing::info!(
                caller,
                bot = %bot.profile().name,
                url = %bot.model().chat_completions_url(),
                history_rounds = ?bot.memory(),
                "handling request"
            );
            tokio::time::sleep(hold).await;
            active.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, PoolError>(())
        }
    });

    for result in futures::future::join_all(calls).await {
        result?;
    }
    Ok(peak.load(Ordering::SeqCst))
}

/// Reconciles both pools against their files.
///
/// # Errors
///
/// Fails if the pools are not initialized or a registry file is unreadable.
pub async fn refresh() -> Result<(RefreshReport, RefreshReport), DemoError> {
    let models = MODELS.get()?.refresh_all().await?;
    let bots = BOTS.get()?.refresh_all().await?;
    Ok((models, bots))
}

/// Tears down both pools. Bots first, since they were built from models.
pub async fn shutdown() {
    BOTS.cleanup().await;
    MODELS.cleanup().await;
}
