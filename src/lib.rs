pub mod commands;
pub mod config;
pub mod db;
pub mod discord_text;
pub mod error;
pub mod history;
pub mod indexer;
pub mod model;
pub mod platform;
pub mod services;
pub mod updates;
pub mod upvote;

#[cfg(test)]
mod testing;

use std::sync::Arc;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub indexer: indexer::Indexer,
    pub updates: updates::UpdateHandler,
    pub leaderboard: services::leaderboard::LeaderboardService,
}

impl Data {
    /// Wires the indexing core around one store and one platform source.
    pub fn new(
        config: config::Config,
        db: db::Database,
        source: Arc<dyn platform::MessageSource>,
    ) -> Self {
        let fetcher = history::HistoryFetcher::new(source.clone(), config.history_page_size);
        Self {
            indexer: indexer::Indexer::new(db.clone(), fetcher),
            updates: updates::UpdateHandler::new(db.clone(), source),
            leaderboard: services::leaderboard::LeaderboardService::new(
                db,
                config.upvote_policy(),
            ),
            config,
        }
    }
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
