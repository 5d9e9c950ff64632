//! Read access to the chat platform.
//!
//! The indexing core only needs two calls from the platform client: a page of
//! channel history and a single message, both carrying the full reaction set.

pub mod discord;

use crate::error::IndexError;
use crate::model::RawMessage;
use async_trait::async_trait;

pub use discord::DiscordSource;

#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Up to `limit` messages strictly older than `before` (or the newest ones
    /// when `before` is `None`), newest first. An empty page means the start of
    /// the channel was reached; `IndexError::ChannelNotFound` means the channel
    /// itself is gone.
    async fn fetch_page(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> Result<Vec<RawMessage>, IndexError>;

    /// Current state of one message; `IndexError::MessageNotFound` if it is gone.
    async fn fetch_message(&self, channel_id: u64, message_id: u64)
        -> Result<RawMessage, IndexError>;
}
