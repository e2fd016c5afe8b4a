//! Bots pooled end to end over in-memory model and prompt registries.

use corral_bots::{
    BotPool, BotProperties, BotRecord, MemoryPolicy, STANDARD, StandardBotProvider, StaticPrompts,
    bot_factory,
};
use corral_models::{ModelConfig, OPENAI, model_factory};
use corral_pool::{PoolError, PoolSettings, RefreshOutcome, StaticSource};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn gpt() -> ModelConfig {
    ModelConfig::new("openai-gpt-4o", "GPT-4o", OPENAI)
        .with_property("api_key", "sk-test")
        .with_property("model", "gpt-4o")
}

fn support_bot() -> BotRecord {
    BotRecord::new("1", "support", "Support", STANDARD).with_properties(BotProperties {
        models_deploy_name: Some("openai-gpt-4o".into()),
        models_prompt_code: Some("support-prompt".into()),
        memory_enable: true,
        memory_strategy: Some("messages".into()),
        max_message_rounds: Some(4),
        ..BotProperties::default()
    })
}

struct Fixture {
    models: Arc<StaticSource<ModelConfig>>,
    bots: Arc<StaticSource<BotRecord>>,
    pool: Arc<BotPool>,
}

async fn fixture(bots: Vec<BotRecord>) -> Fixture {
    let models = Arc::new(StaticSource::new(vec![gpt()]));
    let prompts = Arc::new(StaticPrompts::new().with("support-prompt", "You help customers."));
    let provider = StandardBotProvider::new(models.clone(), prompts, Arc::new(model_factory()));
    let bots = Arc::new(StaticSource::new(bots));
    let pool = BotPool::initialize(bot_factory(provider), bots.clone(), PoolSettings::default())
        .await
        .unwrap();

    Fixture { models, bots, pool }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn standard_bot_resolves_model_prompt_and_memory() {
    let fx = fixture(vec![support_bot()]).await;

    let bot = fx.pool.checkout("1").await.unwrap();

    assert_eq!(bot.profile().code, "support");
    assert_eq!(bot.profile().deploy_name, "openai-gpt-4o");
    assert_eq!(bot.profile().model_provider, OPENAI);
    assert_eq!(bot.model().model(), "gpt-4o");
    assert_eq!(bot.prompt_template(), "You help customers.");
    assert_eq!(bot.memory(), MemoryPolicy::Rounds(4));
}

#[tokio::test]
async fn missing_prompt_falls_back_to_empty_template() {
    let mut record = support_bot();
    record.properties.models_prompt_code = Some("gone".into());
    let fx = fixture(vec![record]).await;

    let bot = fx.pool.checkout("1").await.unwrap();

    assert_eq!(bot.prompt_template(), "");
}

#[tokio::test]
async fn unresolvable_bots_are_skipped_at_load() {
    let mut no_model = BotRecord::new("2", "no-model", "No model", STANDARD);
    no_model.properties.models_deploy_name = None;
    let mut unknown_model = support_bot();
    unknown_model.id = "3".into();
    unknown_model.properties.models_deploy_name = Some("retired".into());
    let customized = BotRecord::new("4", "custom", "Custom", "customized");

    let fx = fixture(vec![support_bot(), no_model, unknown_model, customized]).await;

    assert_eq!(fx.pool.keys(), vec!["1"]);
}

#[tokio::test]
async fn editing_a_bot_rebuilds_it() {
    let fx = fixture(vec![support_bot()]).await;

    let mut edited = support_bot();
    edited.properties.memory_enable = false;
    fx.bots.upsert(edited);

    assert_eq!(fx.pool.refresh_one("1").await.unwrap(), RefreshOutcome::Updated);
    assert_eq!(
        fx.pool.checkout("1").await.unwrap().memory(),
        MemoryPolicy::Disabled
    );
}

#[tokio::test]
async fn refresh_surfaces_a_deactivated_model() {
    let fx = fixture(vec![support_bot()]).await;

    let mut edited = support_bot();
    edited.name = "Support v2".into();
    fx.bots.upsert(edited);
    fx.models.remove("openai-gpt-4o");

    assert!(matches!(
        fx.pool.refresh_one("1").await,
        Err(PoolError::Factory { key, .. }) if key == "1"
    ));
    // The previous bot keeps serving.
    assert_eq!(
        fx.pool.checkout("1").await.unwrap().profile().name,
        "Support"
    );
}
