// src/config/mod.rs - Bot configuration loaded once at startup

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script-app credentials for the Reddit API. Opaque to the bot core; only
/// the platform layer looks inside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

fn default_poll_interval() -> u64 {
    15
}

/// Static process-wide configuration. Loaded once from YAML at startup and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfiguration {
    pub reddit_credentials: RedditCredentials,
    /// Subreddits whose moderators may invoke the bot.
    pub subreddits: Vec<String>,
    /// Reply template. Recognized placeholders: `:num_ratings:`, `:mean:`,
    /// `:mode:`, `:median:`, `:stdev:`, `:max:`, `:min:`.
    pub comment: String,
    /// Seconds to wait between inbox polls that come back empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl BotConfiguration {
    /// Load and validate the configuration file. Any failure here is fatal:
    /// the process must not enter the mention loop with a bad config.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("config file {} is malformed", path.display()))?;
        config.validate()?;
        info!(
            "Loaded configuration monitoring {} subreddit(s)",
            config.subreddits.len()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.subreddits.is_empty() {
            anyhow::bail!("config lists no subreddits to monitor");
        }
        if self.comment.trim().is_empty() {
            anyhow::bail!("config has an empty reply template");
        }
        Ok(())
    }

    /// Case-insensitive membership test against the monitored subreddit list.
    pub fn monitors_subreddit(&self, name: &str) -> bool {
        self.subreddits.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_CONFIG: &str = r#"
reddit_credentials:
  client_id: abc
  client_secret: def
  username: statsbot
  password: hunter2
subreddits:
  - truerateme
  - rateme
comment: "Ratings: :num_ratings:, mean :mean:"
"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_valid_config() {
        let file = write_temp(VALID_CONFIG);
        let config = BotConfiguration::load(file.path()).expect("valid config loads");
        assert_eq!(config.subreddits.len(), 2);
        assert_eq!(config.reddit_credentials.username, "statsbot");
        // Default applies when the key is absent.
        assert_eq!(config.poll_interval_seconds, 15);
    }

    #[test]
    fn subreddit_check_is_case_insensitive() {
        let file = write_temp(VALID_CONFIG);
        let config = BotConfiguration::load(file.path()).expect("valid config loads");
        assert!(config.monitors_subreddit("TrueRateMe"));
        assert!(config.monitors_subreddit("RATEME"));
        assert!(!config.monitors_subreddit("unrelated"));
    }

    #[test]
    fn rejects_missing_file() {
        assert!(BotConfiguration::load(Path::new("/nonexistent/config.yaml")).is_err());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let file = write_temp("reddit_credentials: [not, a, mapping");
        assert!(BotConfiguration::load(file.path()).is_err());
    }

    #[test]
    fn rejects_empty_subreddit_list() {
        let broken = VALID_CONFIG.replace(
            "subreddits:\n  - truerateme\n  - rateme",
            "subreddits: []",
        );
        let file = write_temp(&broken);
        assert!(BotConfiguration::load(file.path()).is_err());
    }

    #[test]
    fn rejects_blank_template() {
        let broken = VALID_CONFIG.replace(
            "comment: \"Ratings: :num_ratings:, mean :mean:\"",
            "comment: \"  \"",
        );
        let file = write_temp(&broken);
        assert!(BotConfiguration::load(file.path()).is_err());
    }
}
