pub mod admin;
pub mod index;
pub mod leaderboard;
pub mod profile;
pub mod stats;

use crate::error::IndexFailure;
use crate::{Context, Data, Error};
use poise::serenity_prelude as serenity;

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        stats::ping(),
        stats::stats(),
        index::index(),
        index::indexall(),
        admin::cleardb(),
        admin::reindexall(),
        leaderboard::leaderboard(),
        profile::profile(),
    ]
}

/// Text channels of the invoking guild, in id order.
pub async fn guild_text_channels(ctx: Context<'_>) -> Result<Vec<u64>, Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    let channels = guild_id.channels(ctx.http()).await?;
    let mut ids: Vec<u64> = channels
        .values()
        .filter(|c| matches!(c.kind, serenity::ChannelType::Text | serenity::ChannelType::News))
        .map(|c| c.id.get())
        .collect();
    ids.sort_unstable();
    Ok(ids)
}

/// Final status line for an indexing run.
pub fn index_report(what: &str, result: &Result<usize, IndexFailure>) -> String {
    match result {
        Ok(count) => format!("**DONE!** Indexed {}. _({} messages)_", what, count),
        Err(failure) => format!(
            "**ERROR!** Indexing {} failed: {}. _({} messages were indexed before the error)_",
            what, failure.source, failure.indexed
        ),
    }
}
