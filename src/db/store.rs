use super::Database;
use crate::model::{FetchStamp, RawMessage, RawReaction};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};
use tracing::debug;

// Write primitives. Each takes a plain `Connection` so they compose inside
// one transaction in `store_message`.

fn upsert_channel(conn: &Connection, channel_id: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO channels (channel_id) VALUES (?1)
         ON CONFLICT(channel_id) DO NOTHING",
        [channel_id as i64],
    )?;
    Ok(())
}

/// Returns false when the stored row carries a newer stamp and was left alone.
fn upsert_message(
    conn: &Connection,
    channel_id: u64,
    message_id: u64,
    author_id: u64,
    timestamp: DateTime<Utc>,
    content: Option<&str>,
    stamp: FetchStamp,
) -> Result<bool> {
    let changed = conn.execute(
        "INSERT INTO messages (channel_id, message_id, author_id, timestamp, content, fetched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(channel_id, message_id) DO UPDATE SET
            author_id = excluded.author_id,
            timestamp = excluded.timestamp,
            content = excluded.content,
            fetched_at = excluded.fetched_at
         WHERE excluded.fetched_at >= messages.fetched_at",
        params![
            channel_id as i64,
            message_id as i64,
            author_id as i64,
            timestamp.timestamp(),
            content,
            stamp.as_i64(),
        ],
    )?;
    Ok(changed > 0)
}

fn replace_reactions(
    conn: &Connection,
    channel_id: u64,
    message_id: u64,
    reactions: &[RawReaction],
) -> Result<()> {
    conn.execute(
        "DELETE FROM reactions WHERE channel_id = ?1 AND message_id = ?2",
        [channel_id as i64, message_id as i64],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO reactions (channel_id, message_id, user_id, emoji)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for reaction in reactions {
        stmt.execute(params![
            channel_id as i64,
            message_id as i64,
            reaction.user_id as i64,
            reaction.emoji,
        ])?;
    }
    Ok(())
}

impl Database {
    pub fn upsert_channel(&self, channel_id: u64) -> Result<()> {
        upsert_channel(&self.conn(), channel_id)
    }

    pub fn upsert_message(
        &self,
        channel_id: u64,
        message_id: u64,
        author_id: u64,
        timestamp: DateTime<Utc>,
        content: Option<&str>,
        stamp: FetchStamp,
    ) -> Result<bool> {
        upsert_message(
            &self.conn(),
            channel_id,
            message_id,
            author_id,
            timestamp,
            content,
            stamp,
        )
    }

    /// Makes the stored reactions of a message exactly `reactions`.
    ///
    /// Duplicate (user, emoji) pairs in the input collapse into one row.
    pub fn replace_reactions(
        &self,
        channel_id: u64,
        message_id: u64,
        reactions: &[RawReaction],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        replace_reactions(&tx, channel_id, message_id, reactions)?;
        tx.commit()
    }

    /// Upserts the channel, the message and its full reaction set as one transaction.
    ///
    /// A state fetched before the one already stored is discarded whole and
    /// `false` is returned.
    pub fn store_message(&self, message: &RawMessage, stamp: FetchStamp) -> Result<bool> {
        debug!(
            "Database: Storing message {} in channel {} ({} reactions)",
            message.id,
            message.channel_id,
            message.reactions.len()
        );
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        upsert_channel(&tx, message.channel_id)?;
        let fresh = upsert_message(
            &tx,
            message.channel_id,
            message.id,
            message.author_id,
            message.timestamp,
            message.content.as_deref(),
            stamp,
        )?;
        if fresh {
            replace_reactions(&tx, message.channel_id, message.id, &message.reactions)?;
        } else {
            debug!(
                "Database: Message {} in channel {} already holds a newer state",
                message.id, message.channel_id
            );
        }
        tx.commit()?;
        Ok(fresh)
    }
}

#[cfg(test)]
impl Database {
    pub fn channel_exists(&self, channel_id: u64) -> Result<bool> {
        self.conn()
            .prepare("SELECT 1 FROM channels WHERE channel_id = ?1")?
            .exists([channel_id as i64])
    }

    /// Reads back a stored message with its reactions sorted by (user, emoji).
    pub fn get_message(&self, channel_id: u64, message_id: u64) -> Result<Option<RawMessage>> {
        use rusqlite::OptionalExtension;

        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT author_id, timestamp, content FROM messages
                 WHERE channel_id = ?1 AND message_id = ?2",
                [channel_id as i64, message_id as i64],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((author_id, timestamp, content)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT user_id, emoji FROM reactions
             WHERE channel_id = ?1 AND message_id = ?2
             ORDER BY user_id, emoji",
        )?;
        let reactions = stmt
            .query_map([channel_id as i64, message_id as i64], |row| {
                Ok(RawReaction::new(row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(RawMessage {
            id: message_id,
            channel_id,
            author_id: author_id as u64,
            timestamp: from_unix(timestamp),
            content,
            reactions,
        }))
    }
}

pub(super) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
