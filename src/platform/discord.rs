use super::MessageSource;
use crate::error::IndexError;
use crate::model::{RawMessage, RawReaction};
use async_trait::async_trait;
use chrono::DateTime;
use serenity::all::{ChannelId, GetMessages, Message, MessageId, ReactionType, UserId};
use serenity::http::Http;
use std::sync::Arc;
use tracing::{debug, warn};

/// Discord caps reaction user listings at 100 per request
const REACTION_PAGE: u8 = 100;

/// `MessageSource` backed by serenity's REST client
#[derive(Clone)]
pub struct DiscordSource {
    http: Arc<Http>,
}

impl DiscordSource {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Expands a message's reaction summary into the individual (user, emoji) pairs.
    ///
    /// A 404 while listing one emoji (the message or a custom emoji was deleted
    /// meanwhile) drops that emoji's reactions instead of failing the page.
    async fn reactions_of(&self, message: &Message) -> Result<Vec<RawReaction>, IndexError> {
        let mut reactions = Vec::new();
        for reaction in &message.reactions {
            if reaction.count == 0 {
                continue;
            }
            let emoji = emoji_key(&reaction.reaction_type);
            let mut after: Option<UserId> = None;
            loop {
                let users = match message
                    .reaction_users(
                        &self.http,
                        reaction.reaction_type.clone(),
                        Some(REACTION_PAGE),
                        after,
                    )
                    .await
                {
                    Ok(users) => users,
                    Err(e) if is_not_found(&e) => {
                        warn!(
                            "Reactions {} on message {} in channel {} are gone, skipping",
                            emoji, message.id, message.channel_id
                        );
                        break;
                    }
                    Err(e) => return Err(map_error(e, message.channel_id, Some(message.id))),
                };

                let exhausted = users.len() < REACTION_PAGE as usize;
                after = users.last().map(|u| u.id);
                reactions.extend(
                    users
                        .into_iter()
                        .map(|u| RawReaction::new(u.id.get(), emoji.clone())),
                );
                if exhausted || after.is_none() {
                    break;
                }
            }
        }
        Ok(reactions)
    }

    async fn to_raw(&self, message: Message) -> Result<RawMessage, IndexError> {
        let reactions = self.reactions_of(&message).await?;
        let content = Some(message.content).filter(|c| !c.trim().is_empty());
        Ok(RawMessage {
            id: message.id.get(),
            channel_id: message.channel_id.get(),
            author_id: message.author.id.get(),
            timestamp: DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
                .unwrap_or_default(),
            content,
            reactions,
        })
    }
}

#[async_trait]
impl MessageSource for DiscordSource {
    async fn fetch_page(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> Result<Vec<RawMessage>, IndexError> {
        let channel = ChannelId::new(channel_id);
        let mut builder = GetMessages::new().limit(limit);
        if let Some(before) = before {
            builder = builder.before(MessageId::new(before));
        }

        let messages = channel
            .messages(&self.http, builder)
            .await
            .map_err(|e| map_error(e, channel, None))?;
        debug!(
            "Fetched {} messages from channel {} before {:?}",
            messages.len(),
            channel_id,
            before
        );

        let mut page = Vec::with_capacity(messages.len());
        for message in messages {
            page.push(self.to_raw(message).await?);
        }
        Ok(page)
    }

    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<RawMessage, IndexError> {
        let channel = ChannelId::new(channel_id);
        let message_id = MessageId::new(message_id);
        let message = channel
            .message(&self.http, message_id)
            .await
            .map_err(|e| map_error(e, channel, Some(message_id)))?;
        self.to_raw(message).await
    }
}

/// Stable identifier stored for a reaction emoji: the character itself for
/// unicode emoji, the name (or id when nameless) for custom emoji.
pub fn emoji_key(reaction: &ReactionType) -> String {
    match reaction {
        ReactionType::Unicode(emoji) => emoji.clone(),
        ReactionType::Custom { id, name, .. } => {
            name.clone().unwrap_or_else(|| id.get().to_string())
        }
        other => other.to_string(),
    }
}

fn is_not_found(err: &serenity::Error) -> bool {
    matches!(err, serenity::Error::Http(http) if http.status_code().is_some_and(|s| s.as_u16() == 404))
}

fn map_error(err: serenity::Error, channel: ChannelId, message: Option<MessageId>) -> IndexError {
    match (is_not_found(&err), message) {
        (true, Some(message)) => IndexError::MessageNotFound {
            channel_id: channel.get(),
            message_id: message.get(),
        },
        (true, None) => IndexError::ChannelNotFound(channel.get()),
        (false, Some(message)) => {
            IndexError::PlatformFetch(format!("message {message} in channel {channel}: {err}"))
        }
        (false, None) => IndexError::PlatformFetch(format!("channel {channel}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::EmojiId;

    #[test]
    fn test_non_http_errors_are_transient() {
        let err = map_error(
            serenity::Error::Other("gateway closed"),
            ChannelId::new(1),
            Some(MessageId::new(5)),
        );
        assert!(!is_not_found(&serenity::Error::Other("gateway closed")));
        assert!(matches!(err, IndexError::PlatformFetch(ref m) if m.contains("message 5 in channel 1")));
    }

    #[test]
    fn test_emoji_key() {
        assert_eq!(emoji_key(&ReactionType::Unicode("👍".to_string())), "👍");
        assert_eq!(
            emoji_key(&ReactionType::Custom {
                animated: false,
                id: EmojiId::new(42),
                name: Some("upvote".to_string()),
            }),
            "upvote"
        );
        assert_eq!(
            emoji_key(&ReactionType::Custom {
                animated: false,
                id: EmojiId::new(42),
                name: None,
            }),
            "42"
        );
    }
}
