use crate::db::Database;
use crate::error::{IndexError, IndexFailure};
use crate::history::HistoryFetcher;
use futures::future::join_all;
use futures::{pin_mut, StreamExt};
use tracing::{debug, error, info, warn};

/// Copies channel history from the platform into the store.
#[derive(Clone)]
pub struct Indexer {
    db: Database,
    fetcher: HistoryFetcher,
}

impl Indexer {
    pub fn new(db: Database, fetcher: HistoryFetcher) -> Self {
        Self { db, fetcher }
    }

    /// Indexes every message of a channel and returns how many were stored.
    ///
    /// Messages are committed one at a time in fetch order, so a failure
    /// part-way keeps what was already stored and reports that count in the
    /// `IndexFailure`. A channel deleted mid-fetch ends the run early with the
    /// partial count as success. The channel row is only created once a
    /// message is stored or the history was read to the end.
    pub async fn index(&self, channel_id: u64) -> Result<usize, IndexFailure> {
        info!("Indexer: indexing channel {}", channel_id);
        let stream = self.fetcher.history(channel_id);
        pin_mut!(stream);

        let mut indexed = 0usize;
        while let Some(next) = stream.next().await {
            let fetched = match next {
                Ok(fetched) => fetched,
                Err(IndexError::ChannelNotFound(_)) => {
                    warn!(
                        "Indexer: channel {} disappeared; stopping after {} messages",
                        channel_id, indexed
                    );
                    return Ok(indexed);
                }
                Err(e) => {
                    error!(
                        "Indexer: channel {} aborted after {} messages: {}",
                        channel_id, indexed, e
                    );
                    return Err(IndexFailure::new(indexed, e));
                }
            };

            self.db
                .run_blocking(move |db| db.store_message(&fetched.message, fetched.stamp))
                .await
                .map_err(|e| IndexFailure::new(indexed, e))?;
            indexed += 1;

            if indexed % 1000 == 0 {
                debug!("Indexer: channel {} progress {} messages", channel_id, indexed);
            }
        }

        self.db
            .run_blocking(move |db| db.upsert_channel(channel_id))
            .await
            .map_err(|e| IndexFailure::new(indexed, e))?;

        info!("Indexer: channel {} done ({} messages)", channel_id, indexed);
        Ok(indexed)
    }

    /// Indexes all channels concurrently and sums the counts.
    ///
    /// Every channel runs to completion or to its own failure; the first
    /// failure is returned with the total committed across all channels.
    pub async fn index_all(&self, channel_ids: &[u64]) -> Result<usize, IndexFailure> {
        let results = join_all(channel_ids.iter().map(|&id| self.index(id))).await;

        let mut total = 0usize;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(count) => total += count,
                Err(failure) => {
                    total += failure.indexed;
                    first_error.get_or_insert(failure.source);
                }
            }
        }

        match first_error {
            Some(source) => Err(IndexFailure::new(total, source)),
            None => Ok(total),
        }
    }

    /// Clears the store, then indexes every channel from scratch.
    pub async fn reindex_all(&self, channel_ids: &[u64]) -> Result<usize, IndexFailure> {
        info!("Indexer: full reindex of {} channels", channel_ids.len());
        self.db
            .run_blocking(|db| db.clear_all())
            .await
            .map_err(|e| IndexFailure::new(0, e))?;
        self.index_all(channel_ids).await
    }

    pub async fn clear(&self) -> Result<(), IndexError> {
        self.db.run_blocking(|db| db.clear_all()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawMessage;
    use crate::platform::MessageSource;
    use crate::testing::{message, MemorySource};
    use crate::updates::UpdateHandler;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Platform where message 1 of channel 1 gains a reaction, and the live
    /// update for it is stored, after the first history page was read but
    /// before that page is handed back.
    struct RacingSource {
        platform: Arc<MemorySource>,
        updates: UpdateHandler,
        raced: AtomicBool,
    }

    #[async_trait]
    impl MessageSource for RacingSource {
        async fn fetch_page(
            &self,
            channel_id: u64,
            before: Option<u64>,
            limit: u8,
        ) -> Result<Vec<RawMessage>, IndexError> {
            let page = self.platform.fetch_page(channel_id, before, limit).await?;
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.platform.put(message(1, 1, 101, &[(1, "👍"), (2, "👍")]));
                self.updates.on_message_changed(1, 1).await?;
            }
            Ok(page)
        }

        async fn fetch_message(
            &self,
            channel_id: u64,
            message_id: u64,
        ) -> Result<RawMessage, IndexError> {
            self.platform.fetch_message(channel_id, message_id).await
        }
    }

    fn indexer(source: Arc<MemorySource>, page_size: u8) -> (Indexer, Database) {
        let db = Database::open_in_memory().unwrap();
        let fetcher = HistoryFetcher::new(source, page_size);
        (Indexer::new(db.clone(), fetcher), db)
    }

    #[tokio::test]
    async fn test_index_is_idempotent() {
        let source = Arc::new(MemorySource::new().with_channel(1, 25));
        let (indexer, db) = indexer(source, 10);

        assert_eq!(indexer.index(1).await.unwrap(), 25);
        let first = db.stats().unwrap();
        let first_message = db.get_message(1, 13).unwrap();

        assert_eq!(indexer.index(1).await.unwrap(), 25);
        assert_eq!(db.stats().unwrap(), first);
        assert_eq!(db.get_message(1, 13).unwrap(), first_message);
        assert_eq!(first.messages, 25);
        assert_eq!(first.reactions, 25);
    }

    #[tokio::test]
    async fn test_empty_channel_creates_channel_row() {
        let source = Arc::new(MemorySource::new().with_channel(9, 0));
        let (indexer, db) = indexer(source, 100);

        assert_eq!(indexer.index(9).await.unwrap(), 0);
        assert!(db.channel_exists(9).unwrap());
        assert_eq!(db.stats().unwrap().messages, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_then_rerun() {
        let source = Arc::new(MemorySource::new().with_channel(1, 10));
        source.fail_after(7);
        let (indexer, db) = indexer(source.clone(), 3);

        let failure = indexer.index(1).await.unwrap_err();
        assert_eq!(failure.indexed, 7);
        assert!(matches!(failure.source, IndexError::PlatformFetch(_)));
        assert_eq!(db.stats().unwrap().messages, 7);

        source.recover();
        assert_eq!(indexer.index(1).await.unwrap(), 10);
        assert_eq!(db.stats().unwrap().messages, 10);
    }

    #[tokio::test]
    async fn test_channel_vanishing_keeps_partial_count() {
        let source = Arc::new(MemorySource::new().with_channel(1, 10));
        source.vanish_after(4);
        let (indexer, db) = indexer(source, 2);

        assert_eq!(indexer.index(1).await.unwrap(), 4);
        assert_eq!(db.stats().unwrap().messages, 4);
    }

    #[tokio::test]
    async fn test_index_picks_up_edits() {
        let source = Arc::new(MemorySource::new().with_channel(1, 3));
        let (indexer, db) = indexer(source.clone(), 100);
        indexer.index(1).await.unwrap();

        let mut edited = message(1, 2, 101, &[(7, "⬆️")]);
        edited.content = Some("edited".to_string());
        source.put(edited.clone());
        indexer.index(1).await.unwrap();

        assert_eq!(db.get_message(1, 2).unwrap().unwrap(), edited);
        assert_eq!(db.stats().unwrap().messages, 3);
    }

    #[tokio::test]
    async fn test_index_all_sums_channels() {
        let source = Arc::new(MemorySource::new().with_channel(1, 5).with_channel(2, 8).with_channel(3, 0));
        let (indexer, db) = indexer(source, 4);

        assert_eq!(indexer.index_all(&[1, 2, 3]).await.unwrap(), 13);
        assert_eq!(db.stats().unwrap().channels, 3);
    }

    #[tokio::test]
    async fn test_index_all_missing_channel_is_not_fatal() {
        let source = Arc::new(MemorySource::new().with_channel(1, 5));
        let (indexer, db) = indexer(source, 4);

        // channel 2 was never created on the platform
        assert_eq!(indexer.index_all(&[1, 2]).await.unwrap(), 5);
        assert!(!db.channel_exists(2).unwrap());
        assert_eq!(db.stats().unwrap().channels, 1);
    }

    #[tokio::test]
    async fn test_live_update_survives_concurrent_index() {
        let platform = Arc::new(MemorySource::new().with_channel(1, 3));
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(RacingSource {
            platform: platform.clone(),
            updates: UpdateHandler::new(db.clone(), platform.clone()),
            raced: AtomicBool::new(false),
        });
        let indexer = Indexer::new(db.clone(), HistoryFetcher::new(source, 100));

        assert_eq!(indexer.index(1).await.unwrap(), 3);

        let current = platform.fetch_message(1, 1).await.unwrap();
        assert_eq!(current.reactions.len(), 2);
        assert_eq!(db.get_message(1, 1).unwrap().unwrap(), current);
    }

    #[tokio::test]
    async fn test_vanished_message_is_a_failure_not_a_short_success() {
        let source = Arc::new(MemorySource::new().with_channel(1, 10));
        source.lose_message_after(3);
        let (indexer, db) = indexer(source, 3);

        let failure = indexer.index(1).await.unwrap_err();
        assert_eq!(failure.indexed, 3);
        assert!(matches!(
            failure.source,
            IndexError::MessageNotFound { channel_id: 1, .. }
        ));
        assert_eq!(db.stats().unwrap().messages, 3);
    }

    #[tokio::test]
    async fn test_missing_channel_leaves_no_row() {
        let source = Arc::new(MemorySource::new());
        let (indexer, db) = indexer(source, 100);

        assert_eq!(indexer.index(4).await.unwrap(), 0);
        assert_eq!(db.stats().unwrap().channels, 0);
    }

    #[tokio::test]
    async fn test_index_all_reports_failure_with_total() {
        let source = Arc::new(MemorySource::new().with_channel(1, 5).with_channel(2, 5));
        source.fail_after(7);
        let (indexer, db) = indexer(source, 100);

        let failure = indexer.index_all(&[1, 2]).await.unwrap_err();
        assert_eq!(failure.indexed, 7);
        assert_eq!(db.stats().unwrap().messages, 7);
    }

    #[tokio::test]
    async fn test_reindex_all_drops_stale_rows() {
        let source = Arc::new(MemorySource::new().with_channel(1, 5));
        let (indexer, db) = indexer(source.clone(), 100);
        indexer.index(1).await.unwrap();

        source.delete(1, 3);
        assert_eq!(indexer.index(1).await.unwrap(), 4);
        assert_eq!(db.stats().unwrap().messages, 5, "plain index keeps deleted messages");

        assert_eq!(indexer.reindex_all(&[1]).await.unwrap(), 4);
        assert_eq!(db.stats().unwrap().messages, 4);
        assert!(db.get_message(1, 3).unwrap().is_none());
    }
}
