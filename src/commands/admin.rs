use super::{guild_text_channels, index_report};
use crate::{Context, Error};
use tracing::info;

/// Clear the database
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn cleardb(ctx: Context<'_>) -> Result<(), Error> {
    info!("Cleardb command received from {}", ctx.author().name);
    let reply = ctx.say("Clearing the database...").await?;

    ctx.data().indexer.clear().await?;

    reply
        .edit(
            ctx,
            poise::CreateReply::default().content("**DONE!** Cleared the database."),
        )
        .await?;
    Ok(())
}

/// Clear the database and reindex all channels
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn reindexall(ctx: Context<'_>) -> Result<(), Error> {
    info!("Reindexall command received from {}", ctx.author().name);
    let reply = ctx.say("Clearing the database and indexing all channels...").await?;

    let channels = guild_text_channels(ctx).await?;
    let result = ctx.data().indexer.reindex_all(&channels).await;

    reply
        .edit(
            ctx,
            poise::CreateReply::default().content(index_report("all channels", &result)),
        )
        .await?;
    Ok(())
}
