mod config;
mod dictionary;
mod platform;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dictionary::DictionaryClient;
use crate::router::Router;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,panbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Dictionary: {}", config.dictionary.base_url);
    info!("  Match policy: {}", config.dictionary.match_policy);
    info!("  Laugh emoji: {}", config.triggers.laugh_emoji);

    let dictionary = Arc::new(DictionaryClient::new(config.dictionary.clone()));
    let router = Arc::new(Router::new(dictionary, config.triggers.clone()));

    info!("Pan Bot started.");
    platform::discord::run(router, &config.discord.bot_token).await?;

    info!("Pan Bot stopped.");
    Ok(())
}
