//! Error types for the indexing pipeline

use thiserror::Error;

/// Errors raised while fetching, storing or aggregating channel history
#[derive(Debug, Error)]
pub enum IndexError {
    /// Transient platform failure (rate limit, network fault, 5xx)
    #[error("Platform fetch failed: {0}")]
    PlatformFetch(String),

    /// The channel no longer exists on the platform
    #[error("Channel {0} not found")]
    ChannelNotFound(u64),

    /// A single message no longer exists on the platform
    #[error("Message {message_id} in channel {channel_id} not found")]
    MessageNotFound { channel_id: u64, message_id: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage task failed: {0}")]
    StorageTask(#[from] tokio::task::JoinError),
}

impl IndexError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IndexError::ChannelNotFound(_) | IndexError::MessageNotFound { .. }
        )
    }
}

/// An aborted indexing run, carrying the number of messages already committed
#[derive(Debug, Error)]
#[error("{source} (after indexing {indexed} messages)")]
pub struct IndexFailure {
    pub indexed: usize,
    #[source]
    pub source: IndexError,
}

impl IndexFailure {
    pub fn new(indexed: usize, source: IndexError) -> Self {
        Self { indexed, source }
    }
}
