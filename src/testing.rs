//! Test fixtures shared across module tests.

use crate::error::IndexError;
use crate::db::Database;
use crate::model::{FetchStamp, RawMessage, RawReaction};
use crate::platform::MessageSource;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn message(channel_id: u64, id: u64, author_id: u64, reactions: &[(u64, &str)]) -> RawMessage {
    RawMessage {
        id,
        channel_id,
        author_id,
        timestamp: Utc.timestamp_opt(1_600_000_000 + id as i64, 0).unwrap(),
        content: Some(format!("message {id}")),
        reactions: reactions
            .iter()
            .map(|(user, emoji)| RawReaction::new(*user, *emoji))
            .collect(),
    }
}

/// Stores `message` as a fresh fetch.
pub fn store(db: &Database, message: &RawMessage) {
    db.store_message(message, FetchStamp::next()).unwrap();
}

#[derive(Clone, Copy)]
enum Failure {
    Transient,
    ChannelGone,
    MessageGone,
}

/// In-memory platform: channels keyed by id, messages keyed by id.
#[derive(Default)]
pub struct MemorySource {
    channels: Mutex<BTreeMap<u64, BTreeMap<u64, RawMessage>>>,
    failure: Mutex<Option<(usize, Failure)>>,
    served: AtomicUsize,
    page_requests: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(self, channel_id: u64, count: u64) -> Self {
        self.add_channel(channel_id);
        for id in 1..=count {
            self.put(message(channel_id, id, 100 + id % 3, &[(id, "👍")]));
        }
        self
    }

    pub fn add_channel(&self, channel_id: u64) {
        self.channels.lock().unwrap().entry(channel_id).or_default();
    }

    /// Inserts or replaces a message, creating its channel if needed.
    pub fn put(&self, message: RawMessage) {
        self.channels
            .lock()
            .unwrap()
            .entry(message.channel_id)
            .or_default()
            .insert(message.id, message);
    }

    pub fn delete(&self, channel_id: u64, message_id: u64) {
        if let Some(channel) = self.channels.lock().unwrap().get_mut(&channel_id) {
            channel.remove(&message_id);
        }
    }

    /// After `served` more messages have been returned, page requests fail transiently.
    pub fn fail_after(&self, served: usize) {
        self.served.store(0, Ordering::SeqCst);
        *self.failure.lock().unwrap() = Some((served, Failure::Transient));
    }

    /// After `served` more messages have been returned, the channel reports as deleted.
    pub fn vanish_after(&self, served: usize) {
        self.served.store(0, Ordering::SeqCst);
        *self.failure.lock().unwrap() = Some((served, Failure::ChannelGone));
    }

    /// After `served` more messages have been returned, the next page fails
    /// because one of its messages vanished while it was being read.
    pub fn lose_message_after(&self, served: usize) {
        self.served.store(0, Ordering::SeqCst);
        *self.failure.lock().unwrap() = Some((served, Failure::MessageGone));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn fetch_page(
        &self,
        channel_id: u64,
        before: Option<u64>,
        limit: u8,
    ) -> Result<Vec<RawMessage>, IndexError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        let channels = self.channels.lock().unwrap();
        let channel = channels
            .get(&channel_id)
            .ok_or(IndexError::ChannelNotFound(channel_id))?;

        let mut page: Vec<RawMessage> = channel
            .values()
            .rev()
            .filter(|m| before.map_or(true, |b| m.id < b))
            .take(limit as usize)
            .cloned()
            .collect();

        if let Some((allowance, failure)) = *self.failure.lock().unwrap() {
            let served = self.served.load(Ordering::SeqCst);
            let remaining = allowance.saturating_sub(served);
            if remaining == 0 && !page.is_empty() {
                return Err(match failure {
                    Failure::Transient => IndexError::PlatformFetch("rate limited".to_string()),
                    Failure::ChannelGone => IndexError::ChannelNotFound(channel_id),
                    Failure::MessageGone => IndexError::MessageNotFound {
                        channel_id,
                        message_id: page[0].id,
                    },
                });
            }
            page.truncate(remaining);
        }

        self.served.fetch_add(page.len(), Ordering::SeqCst);
        Ok(page)
    }

    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<RawMessage, IndexError> {
        self.channels
            .lock()
            .unwrap()
            .get(&channel_id)
            .and_then(|c| c.get(&message_id))
            .cloned()
            .ok_or(IndexError::MessageNotFound {
                channel_id,
                message_id,
            })
    }
}
