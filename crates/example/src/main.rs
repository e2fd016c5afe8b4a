//! Corral demo CLI.
//!
//! Loads model deployments, bots and prompts from JSON files, then walks the
//! pools through their lifecycle.
//!
//! # Usage
//!
//! ```bash
//! corral-demo [bot_id]
//! ```
//!
//! File locations come from `CORRAL_MODELS_FILE`, `CORRAL_BOTS_FILE` and
//! `CORRAL_PROMPTS_FILE` (a `.env` file is honoured), defaulting to the
//! bundled `config/` directory. Pool limits and timeouts come from
//! `CORRAL_DEFAULT_CONCURRENCY`, `CORRAL_ACQUIRE_TIMEOUT_MS` and
//! `CORRAL_DRAIN_TIMEOUT_MS`; logging from `CORRAL_LOG` and `CORRAL_LOG_FORMAT`.

#![expect(clippy::print_stdout, clippy::print_stderr, reason = "CLI output")]

use core::time::Duration;
use corral_core::TracingConfig;
use corral_pool::PoolSettings;
use example::{DemoError, DemoPaths};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    TracingConfig::from_env().init().ok();

    let bot_id = std::env::args().nth(1).unwrap_or_else(|| "1".to_string());

    let result = run(&bot_id).await;
    example::shutdown().await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(bot_id: &str) -> Result<(), DemoError> {
    let settings = PoolSettings::from_env()?;
    example::start(&DemoPaths::from_env(), settings).await?;

    println!("{}", example::status_json()?);

    let peak = example::exercise(bot_id, 8, Duration::from_millis(100)).await?;
    println!("bot {bot_id}: at most {peak} concurrent callers");

    let (models, bots) = example::refresh().await?;
    println!("models refreshed: {}", serde_json::to_string(&models)?);
    println!("bots refreshed: {}", serde_json::to_string(&bots)?);
    Ok(())
}
