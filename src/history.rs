use crate::error::IndexError;
use crate::model::{FetchStamp, Fetched, RawMessage};
use crate::platform::MessageSource;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Discord returns at most 100 messages per history request
pub const MAX_PAGE_SIZE: u8 = 100;

/// Turns paged history requests into one lazy stream of messages.
#[derive(Clone)]
pub struct HistoryFetcher {
    source: Arc<dyn MessageSource>,
    page_size: u8,
}

struct Cursor {
    /// Oldest message id seen so far; the next page starts below it
    before: Option<u64>,
    pending: VecDeque<RawMessage>,
    /// Stamp of the request that produced `pending`
    stamp: FetchStamp,
    exhausted: bool,
}

impl HistoryFetcher {
    pub fn new(source: Arc<dyn MessageSource>, page_size: u8) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Streams a channel's full history, newest message first. Every message
    /// carries the stamp taken before its page was requested.
    ///
    /// Pages are only requested as the stream is consumed. The stream ends
    /// after the first empty page, or with the first error; it cannot be
    /// resumed, a new call starts again from the newest message.
    pub fn history(
        &self,
        channel_id: u64,
    ) -> impl Stream<Item = Result<Fetched, IndexError>> + Send + '_ {
        let cursor = Cursor {
            before: None,
            pending: VecDeque::new(),
            stamp: FetchStamp::default(),
            exhausted: false,
        };

        stream::try_unfold(cursor, move |cursor| self.advance(channel_id, cursor))
    }

    async fn advance(
        &self,
        channel_id: u64,
        mut cursor: Cursor,
    ) -> Result<Option<(Fetched, Cursor)>, IndexError> {
        loop {
            if let Some(message) = cursor.pending.pop_front() {
                let stamp = cursor.stamp;
                return Ok(Some((Fetched { stamp, message }, cursor)));
            }
            if cursor.exhausted {
                return Ok(None);
            }

            let stamp = FetchStamp::next();
            let page = self
                .source
                .fetch_page(channel_id, cursor.before, self.page_size)
                .await?;
            debug!(
                "History: channel {} page of {} before {:?}",
                channel_id,
                page.len(),
                cursor.before
            );

            match page.iter().map(|m| m.id).min() {
                Some(oldest) => cursor.before = Some(oldest),
                None => cursor.exhausted = true,
            }
            cursor.stamp = stamp;
            cursor.pending.extend(page);
        }
    }
}
