/// Channel, message and reaction tables.
///
/// Snowflake ids are stored as INTEGER (they fit in 63 bits); timestamps as
/// unix seconds. `fetched_at` holds the `FetchStamp` of the state last
/// written for a message. Uniqueness is enforced by the primary keys so every write can
/// be an upsert.
pub const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS channels (
        channel_id INTEGER PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS messages (
        channel_id INTEGER NOT NULL REFERENCES channels (channel_id) ON DELETE CASCADE,
        message_id INTEGER NOT NULL,
        author_id INTEGER NOT NULL,
        timestamp INTEGER NOT NULL,
        content TEXT,
        fetched_at INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (channel_id, message_id)
    );
    CREATE INDEX IF NOT EXISTS idx_messages_author ON messages (author_id);

    CREATE TABLE IF NOT EXISTS reactions (
        channel_id INTEGER NOT NULL,
        message_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        emoji TEXT NOT NULL,
        PRIMARY KEY (channel_id, message_id, user_id, emoji),
        FOREIGN KEY (channel_id, message_id)
            REFERENCES messages (channel_id, message_id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_reactions_emoji ON reactions (emoji);
";
