//! Keeps stored messages in sync with live gateway events.

use crate::db::Database;
use crate::error::IndexError;
use crate::model::{FetchStamp, MessageKey};
use crate::platform::MessageSource;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, info};

/// Live events that change a single message's stored state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEvent {
    Edited(MessageKey),
    ReactionAdded(MessageKey),
    ReactionRemoved(MessageKey),
    /// All reactions, or all reactions of one emoji, were cleared
    ReactionsCleared(MessageKey),
}

impl MessageEvent {
    /// Maps a gateway event to the message it touches, if it is one we track.
    pub fn from_gateway(event: &serenity::FullEvent) -> Option<Self> {
        use serenity::FullEvent;

        let event = match event {
            FullEvent::MessageUpdate { event, .. } => {
                MessageEvent::Edited(MessageKey::new(event.channel_id.get(), event.id.get()))
            }
            FullEvent::ReactionAdd { add_reaction } => MessageEvent::ReactionAdded(
                MessageKey::new(add_reaction.channel_id.get(), add_reaction.message_id.get()),
            ),
            FullEvent::ReactionRemove { removed_reaction } => MessageEvent::ReactionRemoved(
                MessageKey::new(
                    removed_reaction.channel_id.get(),
                    removed_reaction.message_id.get(),
                ),
            ),
            FullEvent::ReactionRemoveAll {
                channel_id,
                removed_from_message_id,
            } => MessageEvent::ReactionsCleared(MessageKey::new(
                channel_id.get(),
                removed_from_message_id.get(),
            )),
            FullEvent::ReactionRemoveEmoji { removed_reactions } => {
                MessageEvent::ReactionsCleared(MessageKey::new(
                    removed_reactions.channel_id.get(),
                    removed_reactions.message_id.get(),
                ))
            }
            _ => return None,
        };
        Some(event)
    }

    pub fn key(&self) -> MessageKey {
        match self {
            MessageEvent::Edited(key)
            | MessageEvent::ReactionAdded(key)
            | MessageEvent::ReactionRemoved(key)
            | MessageEvent::ReactionsCleared(key) => *key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The message no longer exists on the platform; stored rows are left as they are
    Missing,
    /// A later fetch of the same message was stored first; this one was dropped
    Superseded,
}

/// Re-derives one message's full state from the platform and stores it.
///
/// Every event triggers the same full refetch rather than applying a delta,
/// so duplicated or reordered events converge on the platform's state.
#[derive(Clone)]
pub struct UpdateHandler {
    db: Database,
    source: Arc<dyn MessageSource>,
}

impl UpdateHandler {
    pub fn new(db: Database, source: Arc<dyn MessageSource>) -> Self {
        Self { db, source }
    }

    pub async fn handle(&self, event: MessageEvent) -> Result<UpdateOutcome, IndexError> {
        debug!("Update: {:?}", event);
        let key = event.key();
        self.on_message_changed(key.channel_id, key.message_id).await
    }

    pub async fn on_message_changed(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<UpdateOutcome, IndexError> {
        let stamp = FetchStamp::next();
        let message = match self.source.fetch_message(channel_id, message_id).await {
            Ok(message) => message,
            Err(e) if e.is_not_found() => {
                info!(
                    "Update: message {} in channel {} is gone, leaving stored copy",
                    message_id, channel_id
                );
                return Ok(UpdateOutcome::Missing);
            }
            Err(e) => return Err(e),
        };

        let fresh = self
            .db
            .run_blocking(move |db| db.store_message(&message, stamp))
            .await?;
        Ok(if fresh {
            UpdateOutcome::Updated
        } else {
            UpdateOutcome::Superseded
        })
    }
}
