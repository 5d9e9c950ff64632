use crate::discord_text::{
    channel_mention, date_tag, join_within, jump_link, quote, user_mention, DISCORD_EMBED_LIMIT,
};
use crate::model::{RankedEntry, RankedMessage};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

const EMBED_COLOR: u32 = 0xF1C40F;

/// Show leaderboards
#[poise::command(
    slash_command,
    guild_only,
    subcommands("channel", "user", "message"),
    subcommand_required
)]
pub async fn leaderboard(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Channel leaderboards
#[poise::command(
    slash_command,
    subcommands("channel_messages", "channel_upvotes"),
    subcommand_required
)]
pub async fn channel(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// User leaderboards
#[poise::command(
    slash_command,
    subcommands("user_messages", "user_upvotes"),
    subcommand_required
)]
pub async fn user(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Message leaderboards
#[poise::command(slash_command, subcommands("message_upvotes"), subcommand_required)]
pub async fn message(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Channels with the most messages
#[poise::command(slash_command, rename = "messages")]
pub async fn channel_messages(ctx: Context<'_>) -> Result<(), Error> {
    let limit = ctx.data().config.leaderboard_limit;
    let entries = ctx.data().leaderboard.channel_messages(limit).await?;
    let rows = ranked_rows(&entries, channel_mention, "messages");
    send_board(ctx, "Channels by messages", rows).await
}

/// Channels with the most upvotes
#[poise::command(slash_command, rename = "upvotes")]
pub async fn channel_upvotes(ctx: Context<'_>) -> Result<(), Error> {
    let limit = ctx.data().config.leaderboard_limit;
    let entries = ctx.data().leaderboard.channel_upvotes(limit).await?;
    let rows = ranked_rows(&entries, channel_mention, "upvotes");
    send_board(ctx, "Channels by upvotes", rows).await
}

/// Users with the most messages
#[poise::command(slash_command, rename = "messages")]
pub async fn user_messages(ctx: Context<'_>) -> Result<(), Error> {
    let limit = ctx.data().config.leaderboard_limit;
    let entries = ctx.data().leaderboard.user_messages(limit).await?;
    let rows = ranked_rows(&entries, user_mention, "messages");
    send_board(ctx, "Users by messages", rows).await
}

/// Users whose messages received the most upvotes
#[poise::command(slash_command, rename = "upvotes")]
pub async fn user_upvotes(ctx: Context<'_>) -> Result<(), Error> {
    let limit = ctx.data().config.leaderboard_limit;
    let entries = ctx.data().leaderboard.user_upvotes(limit).await?;
    let rows = ranked_rows(&entries, user_mention, "upvotes");
    send_board(ctx, "Users by upvotes", rows).await
}

/// Messages with the most upvotes
#[poise::command(slash_command, rename = "upvotes")]
pub async fn message_upvotes(
    ctx: Context<'_>,
    #[description = "Only rank messages from this channel"]
    #[channel_types("Text", "News")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?.get();
    let limit = ctx.data().config.leaderboard_limit;
    let channel_id = channel.map(|c| c.id.get());
    let entries = ctx
        .data()
        .leaderboard
        .message_upvotes(channel_id, limit)
        .await?;

    let rows = entries
        .iter()
        .enumerate()
        .map(|(i, m)| message_row(guild_id, i + 1, m))
        .collect();
    let title = match channel_id {
        Some(_) => "Messages by upvotes in channel",
        None => "Messages by upvotes",
    };
    send_board(ctx, title, rows).await
}

fn ranked_rows(entries: &[RankedEntry], mention: fn(u64) -> String, unit: &str) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("**{}.** {} with {} {}", i + 1, mention(e.key), e.count, unit))
        .collect()
}

fn message_row(guild_id: u64, rank: usize, m: &RankedMessage) -> String {
    let mut row = format!(
        "**{}.** [Link]({}) - {}, {} in {} with {} upvotes",
        rank,
        jump_link(guild_id, m.channel_id, m.message_id),
        date_tag(m.timestamp),
        user_mention(m.author_id),
        channel_mention(m.channel_id),
        m.upvotes
    );
    if let Some(content) = m.content.as_deref().filter(|c| !c.trim().is_empty()) {
        row.push('\n');
        row.push_str(&quote(content));
    }
    row
}

async fn send_board(ctx: Context<'_>, title: &str, rows: Vec<String>) -> Result<(), Error> {
    let description = if rows.is_empty() {
        "Nothing has been indexed yet.".to_string()
    } else {
        join_within(&rows, DISCORD_EMBED_LIMIT)
    };
    let embed = serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(EMBED_COLOR);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
