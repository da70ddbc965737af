//! # Rating Statistics Mention Bot
//!
//! A Reddit bot that listens for username mentions, checks that the
//! requester moderates one of the configured subreddits, and replies with a
//! statistical summary of the numeric ratings found in the referenced
//! submission's top-level comments.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ratestats::prelude::*;
//! use ratestats::platforms::reddit::{RedditConfig, RedditConnection};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BotConfiguration::load("config.yaml".as_ref())?;
//!
//!     let mut platform = RedditConnection::new(RedditConfig::new(&config.reddit_credentials))?;
//!     let username = platform.authenticate().await?;
//!     log::info!("Logged in as u/{}", username);
//!
//!     let mut bot = MentionBot::new(Box::new(platform), config);
//!     bot.run().await;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod platforms;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::{LoopState, MentionBot};
    pub use crate::config::BotConfiguration;
    pub use crate::platforms::{PlatformConnection, PlatformError};
    pub use crate::types::{Comment, Mention, StatsError, Submission, SummaryRecord};
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
