use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Check whether the bot is alive
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Pong!").await?;
    Ok(())
}

/// Show bot stats
#[poise::command(slash_command)]
pub async fn stats(ctx: Context<'_>) -> Result<(), Error> {
    let stats = ctx.data().leaderboard.stats().await?;

    let embed = serenity::CreateEmbed::new()
        .title("Stats")
        .field("Channels", stats.channels.to_string(), true)
        .field("Messages", stats.messages.to_string(), true)
        .field("Reactions", stats.reactions.to_string(), true)
        .color(0x5865F2);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
