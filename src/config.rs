use crate::upvote::{UpvotePolicy, DEFAULT_UPVOTE_EMOJIS};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub dev_guild_id: Option<u64>,
    pub status_message: String,
    /// Messages requested per history page (Discord caps this at 100)
    pub history_page_size: u8,
    pub leaderboard_limit: usize,
    pub upvote_emojis: Vec<String>,
}

/// Optional settings file, read from the working directory
const SETTINGS_FILE: &str = "sibas.toml";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/sibas.db".to_string()),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Sibas vs Selmon".to_string()),
            history_page_size: env::var("HISTORY_PAGE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<u8>()
                .unwrap_or(100)
                .clamp(1, 100),
            leaderboard_limit: env::var("LEADERBOARD_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            upvote_emojis: Self::load_upvote_emojis()?,
        })
    }

    pub fn upvote_policy(&self) -> UpvotePolicy {
        UpvotePolicy::new(self.upvote_emojis.iter().cloned())
    }

    pub fn load_upvote_emojis() -> anyhow::Result<Vec<String>> {
        if let Ok(content) = fs::read_to_string(SETTINGS_FILE) {
            #[derive(Deserialize)]
            struct Settings {
                upvote_emojis: Vec<String>,
            }
            if let Ok(settings) = toml::from_str::<Settings>(&content) {
                return Ok(settings.upvote_emojis);
            }
        }

        // Fallback to env variable: a JSON array or a comma-separated list
        if let Ok(raw) = env::var("UPVOTE_EMOJIS") {
            return Ok(parse_emoji_list(&raw));
        }

        Ok(DEFAULT_UPVOTE_EMOJIS.iter().map(|e| e.to_string()).collect())
    }
}

fn parse_emoji_list(raw: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list;
    }
    raw.split(',')
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("database_url", &self.database_url)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("status_message", &self.status_message)
            .field("history_page_size", &self.history_page_size)
            .field("leaderboard_limit", &self.leaderboard_limit)
            .field("upvote_emojis", &self.upvote_emojis)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_logic() {
        // 1. Missing token
        env::remove_var("DISCORD_TOKEN");
        assert!(Config::build().is_err(), "Should fail when token is missing");

        // 2. Defaults
        env::set_var("DISCORD_TOKEN", "test_token");
        env::remove_var("HISTORY_PAGE_SIZE");
        env::remove_var("LEADERBOARD_LIMIT");
        let config = Config::build().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.history_page_size, 100);
        assert_eq!(config.leaderboard_limit, 10);

        // 3. Page size is clamped to what Discord accepts
        env::set_var("HISTORY_PAGE_SIZE", "0");
        assert_eq!(Config::build().unwrap().history_page_size, 1);
        env::remove_var("HISTORY_PAGE_SIZE");

        // 4. Debug redaction
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("test_token"));
        assert!(debug_output.contains("[REDACTED]"));

        env::remove_var("DISCORD_TOKEN");
    }

    #[test]
    fn test_parse_emoji_list() {
        assert_eq!(parse_emoji_list(r#"["⬆️","upvote"]"#), vec!["⬆️", "upvote"]);
        assert_eq!(parse_emoji_list("👍, upvote ,"), vec!["👍", "upvote"]);
    }
}
