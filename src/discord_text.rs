//! Discord markup for rendering leaderboard rows.

use chrono::{DateTime, Utc};

/// Embed description limit is 4096 characters
pub const DISCORD_EMBED_LIMIT: usize = 4096;

pub fn channel_mention(channel_id: u64) -> String {
    format!("<#{}>", channel_id)
}

pub fn user_mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// Discord renders `<t:SECS:D>` as a date in the reader's timezone.
pub fn date_tag(timestamp: DateTime<Utc>) -> String {
    format!("<t:{}:D>", timestamp.timestamp())
}

pub fn jump_link(guild_id: u64, channel_id: u64, message_id: u64) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild_id, channel_id, message_id
    )
}

/// Prefixes every line with `> ` so Discord renders it as a block quote.
pub fn quote(content: &str) -> String {
    content
        .lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins entries with newlines, dropping trailing entries that would push the
/// text past `limit` characters. Entries are never cut in half.
pub fn join_within(entries: &[String], limit: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for entry in entries {
        let sep = usize::from(!out.is_empty());
        let len = entry.chars().count();
        if used + sep + len > limit {
            break;
        }
        if sep == 1 {
            out.push('\n');
        }
        out.push_str(entry);
        used += sep + len;
    }
    out
}
