use crate::db::Database;
use crate::error::IndexError;
use crate::model::{RankedEntry, RankedMessage, Stats, UserProfile};
use crate::upvote::UpvotePolicy;
use std::sync::Arc;

/// Read-only rankings over the stored history.
///
/// Every call aggregates the current rows; nothing is cached.
#[derive(Clone)]
pub struct LeaderboardService {
    db: Database,
    upvotes: Arc<UpvotePolicy>,
}

impl LeaderboardService {
    pub fn new(db: Database, upvotes: UpvotePolicy) -> Self {
        Self {
            db,
            upvotes: Arc::new(upvotes),
        }
    }

    pub fn upvotes(&self) -> &UpvotePolicy {
        &self.upvotes
    }

    pub async fn stats(&self) -> Result<Stats, IndexError> {
        self.db.run_blocking(|db| db.stats()).await
    }

    pub async fn channel_messages(&self, limit: usize) -> Result<Vec<RankedEntry>, IndexError> {
        self.db
            .run_blocking(move |db| db.channel_message_counts(limit))
            .await
    }

    pub async fn channel_upvotes(&self, limit: usize) -> Result<Vec<RankedEntry>, IndexError> {
        let upvotes = self.upvotes.clone();
        self.db
            .run_blocking(move |db| db.channel_upvote_counts(&upvotes, limit))
            .await
    }

    pub async fn user_messages(&self, limit: usize) -> Result<Vec<RankedEntry>, IndexError> {
        self.db
            .run_blocking(move |db| db.user_message_counts(limit))
            .await
    }

    pub async fn user_upvotes(&self, limit: usize) -> Result<Vec<RankedEntry>, IndexError> {
        let upvotes = self.upvotes.clone();
        self.db
            .run_blocking(move |db| db.user_upvote_counts(&upvotes, limit))
            .await
    }

    pub async fn message_upvotes(
        &self,
        channel_id: Option<u64>,
        limit: usize,
    ) -> Result<Vec<RankedMessage>, IndexError> {
        let upvotes = self.upvotes.clone();
        self.db
            .run_blocking(move |db| db.message_upvote_counts(&upvotes, channel_id, limit))
            .await
    }

    pub async fn user_profile(&self, user_id: u64) -> Result<UserProfile, IndexError> {
        let upvotes = self.upvotes.clone();
        self.db
            .run_blocking(move |db| {
                let messages = db.user_message_count(user_id)?;
                let ranking = db.user_upvote_counts(&upvotes, usize::MAX)?;
                let position = ranking.iter().position(|e| e.key == user_id);
                let top_channel = db.user_channel_counts(user_id, 1)?.into_iter().next();
                Ok(UserProfile {
                    user_id,
                    messages,
                    upvotes: position.map_or(0, |i| ranking[i].count),
                    upvote_rank: position.map(|i| i + 1),
                    top_channel,
                })
            })
            .await
    }
}
