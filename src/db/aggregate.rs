use super::store::from_unix;
use super::Database;
use crate::model::{RankedEntry, RankedMessage};
use crate::upvote::UpvotePolicy;
use rusqlite::{Result, Row, ToSql};
use tracing::debug;

// Every ranking orders by metric descending, then by key ascending so equal
// counts come back in a stable order.

fn ranked_entry(row: &Row<'_>) -> Result<RankedEntry> {
    Ok(RankedEntry {
        key: row.get::<_, i64>(0)? as u64,
        count: row.get::<_, i64>(1)? as u64,
    })
}

/// SQLite's LIMIT is signed; anything larger means "no limit".
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl Database {
    fn query_ranked(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<RankedEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, ranked_entry)?;
        let results = rows.collect::<Result<Vec<_>>>()?;
        debug!("Database: Ranking returned {} rows", results.len());
        Ok(results)
    }

    /// Binds the upvote emoji list followed by `trailing`.
    fn upvote_params<'a>(
        upvotes: &'a UpvotePolicy,
        trailing: &[&'a dyn ToSql],
    ) -> Vec<&'a dyn ToSql> {
        let mut params: Vec<&dyn ToSql> = upvotes
            .emojis()
            .iter()
            .map(|e| e as &dyn ToSql)
            .collect();
        params.extend_from_slice(trailing);
        params
    }

    pub fn channel_message_counts(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        self.query_ranked(
            "SELECT channel_id, COUNT(*) AS n FROM messages
             GROUP BY channel_id
             ORDER BY n DESC, channel_id ASC
             LIMIT ?1",
            &[&sql_limit(limit)],
        )
    }

    pub fn user_message_counts(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        self.query_ranked(
            "SELECT author_id, COUNT(*) AS n FROM messages
             GROUP BY author_id
             ORDER BY n DESC, author_id ASC
             LIMIT ?1",
            &[&sql_limit(limit)],
        )
    }

    pub fn channel_upvote_counts(
        &self,
        upvotes: &UpvotePolicy,
        limit: usize,
    ) -> Result<Vec<RankedEntry>> {
        if upvotes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT r.channel_id, COUNT(*) AS n FROM reactions r
             WHERE r.emoji IN ({})
             GROUP BY r.channel_id
             ORDER BY n DESC, r.channel_id ASC
             LIMIT ?",
            upvotes.placeholders()
        );
        let limit = sql_limit(limit);
        self.query_ranked(&sql, &Self::upvote_params(upvotes, &[&limit]))
    }

    /// Upvotes received, grouped by the author of the upvoted message.
    pub fn user_upvote_counts(
        &self,
        upvotes: &UpvotePolicy,
        limit: usize,
    ) -> Result<Vec<RankedEntry>> {
        if upvotes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT m.author_id, COUNT(*) AS n FROM reactions r
             JOIN messages m ON m.channel_id = r.channel_id AND m.message_id = r.message_id
             WHERE r.emoji IN ({})
             GROUP BY m.author_id
             ORDER BY n DESC, m.author_id ASC
             LIMIT ?",
            upvotes.placeholders()
        );
        let limit = sql_limit(limit);
        self.query_ranked(&sql, &Self::upvote_params(upvotes, &[&limit]))
    }

    pub fn message_upvote_counts(
        &self,
        upvotes: &UpvotePolicy,
        channel_id: Option<u64>,
        limit: usize,
    ) -> Result<Vec<RankedMessage>> {
        if upvotes.is_empty() {
            return Ok(Vec::new());
        }
        let mut sql = format!(
            "SELECT m.channel_id, m.message_id, m.author_id, m.timestamp, m.content, COUNT(*) AS n
             FROM reactions r
             JOIN messages m ON m.channel_id = r.channel_id AND m.message_id = r.message_id
             WHERE r.emoji IN ({})",
            upvotes.placeholders()
        );
        let channel = channel_id.map(|id| id as i64);
        let limit = sql_limit(limit);
        let mut trailing: Vec<&dyn ToSql> = Vec::new();
        if let Some(channel) = channel.as_ref() {
            sql.push_str(" AND m.channel_id = ?");
            trailing.push(channel);
        }
        sql.push_str(
            " GROUP BY m.channel_id, m.message_id
              ORDER BY n DESC, m.message_id ASC, m.channel_id ASC
              LIMIT ?",
        );
        trailing.push(&limit);

        let params = Self::upvote_params(upvotes, &trailing);
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(&params[..], |row| {
            Ok(RankedMessage {
                channel_id: row.get::<_, i64>(0)? as u64,
                message_id: row.get::<_, i64>(1)? as u64,
                author_id: row.get::<_, i64>(2)? as u64,
                timestamp: from_unix(row.get(3)?),
                content: row.get(4)?,
                upvotes: row.get::<_, i64>(5)? as u64,
            })
        })?;
        let results = rows.collect::<Result<Vec<_>>>()?;
        debug!("Database: Message ranking returned {} rows", results.len());
        Ok(results)
    }

    pub fn user_message_count(&self, user_id: u64) -> Result<u64> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages WHERE author_id = ?1",
            [user_id as i64],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Channels a user has written in, ranked by their message count there.
    pub fn user_channel_counts(&self, user_id: u64, limit: usize) -> Result<Vec<RankedEntry>> {
        self.query_ranked(
            "SELECT channel_id, COUNT(*) AS n FROM messages
             WHERE author_id = ?1
             GROUP BY channel_id
             ORDER BY n DESC, channel_id ASC
             LIMIT ?2",
            &[&(user_id as i64), &sql_limit(limit)],
        )
    }
}
