//! Plain data exchanged between the platform, the store and the presentation layer

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// A single (user, emoji) reaction as observed on the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawReaction {
    pub user_id: u64,
    pub emoji: String,
}

impl RawReaction {
    pub fn new(user_id: u64, emoji: impl Into<String>) -> Self {
        Self {
            user_id,
            emoji: emoji.into(),
        }
    }
}

/// Full current state of one message at fetch time
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub timestamp: DateTime<Utc>,
    /// `None` for messages carrying only attachments or embeds
    pub content: Option<String>,
    pub reactions: Vec<RawReaction>,
}

/// Composite key identifying a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub channel_id: u64,
    pub message_id: u64,
}

impl MessageKey {
    pub fn new(channel_id: u64, message_id: u64) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

/// One row of a leaderboard: a channel or user id and its metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedEntry {
    pub key: u64,
    pub count: u64,
}

/// One row of the message upvote leaderboard, with enough detail to display it
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMessage {
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub timestamp: DateTime<Utc>,
    pub content: Option<String>,
    pub upvotes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub channels: u64,
    pub messages: u64,
    pub reactions: u64,
}

/// Per-user summary shown by `/profile`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: u64,
    pub messages: u64,
    pub upvotes: u64,
    /// 1-based position in the user upvote leaderboard, if the user has any upvotes
    pub upvote_rank: Option<usize>,
    pub top_channel: Option<RankedEntry>,
}

/// Ordering stamp taken just before a platform request.
///
/// Stamps are strictly increasing within the process and follow wall-clock
/// microseconds across restarts. A stored message only accepts a state whose
/// stamp is at least the one it was last written with, so a slow fetch cannot
/// overwrite the result of a later one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchStamp(i64);

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

impl FetchStamp {
    pub fn next() -> Self {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0);
        let bump = |last: u64| last.saturating_add(1).max(now);
        let last = LAST_STAMP
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        Self(i64::try_from(bump(last)).unwrap_or(i64::MAX))
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

/// A message state together with the stamp of the request that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub stamp: FetchStamp,
    pub message: RawMessage,
}
