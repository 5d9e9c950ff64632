use super::{guild_text_channels, index_report};
use crate::discord_text::channel_mention;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Index messages of a channel
#[poise::command(slash_command, guild_only)]
pub async fn index(
    ctx: Context<'_>,
    #[description = "Channel to index"]
    #[channel_types("Text", "News")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let mention = channel_mention(channel.id.get());
    info!("Index command received from {} for channel {}", ctx.author().name, channel.id);
    let reply = ctx.say(format!("Indexing {}...", mention)).await?;

    let result = ctx.data().indexer.index(channel.id.get()).await;

    reply
        .edit(
            ctx,
            poise::CreateReply::default().content(index_report(&mention, &result)),
        )
        .await?;
    Ok(())
}

/// Index messages of all channels
#[poise::command(slash_command, guild_only)]
pub async fn indexall(ctx: Context<'_>) -> Result<(), Error> {
    let reply = ctx.say("Indexing all channels...").await?;

    let channels = guild_text_channels(ctx).await?;
    info!("Indexall command received: {} channels", channels.len());
    let result = ctx.data().indexer.index_all(&channels).await;

    reply
        .edit(
            ctx,
            poise::CreateReply::default().content(index_report("all channels", &result)),
        )
        .await?;
    Ok(())
}
