use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use ratestats::platforms::reddit::{RedditConfig, RedditConnection};
use ratestats::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting ratestats v{}", ratestats::VERSION);

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let config = BotConfiguration::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    let mut platform = RedditConnection::new(RedditConfig::new(&config.reddit_credentials))
        .context("failed to build the Reddit client")?;
    let username = platform
        .authenticate()
        .await
        .context("Reddit rejected the configured credentials")?;
    info!("Logged in as Reddit user u/{}", username);

    let mut bot = MentionBot::new(Box::new(platform), config);
    bot.run().await;
    Ok(())
}
