use crate::discord_text::{channel_mention, user_mention};
use crate::model::UserProfile;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Show message and upvote totals for a user
#[poise::command(slash_command, guild_only)]
pub async fn profile(
    ctx: Context<'_>,
    #[description = "User to show (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let profile = ctx.data().leaderboard.user_profile(user.id.get()).await?;

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Profile of {}", user.name))
        .thumbnail(user.face())
        .color(0x2ECC71);
    for (name, value) in profile_fields(&profile) {
        embed = embed.field(name, value, true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn profile_fields(profile: &UserProfile) -> Vec<(&'static str, String)> {
    vec![
        ("User", user_mention(profile.user_id)),
        ("Messages", profile.messages.to_string()),
        ("Upvotes received", profile.upvotes.to_string()),
        (
            "Upvote rank",
            profile
                .upvote_rank
                .map_or_else(|| "Unranked".to_string(), |rank| format!("#{}", rank)),
        ),
        (
            "Most active in",
            profile.top_channel.map_or_else(
                || "Nowhere yet".to_string(),
                |c| format!("{} ({} messages)", channel_mention(c.key), c.count),
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RankedEntry;

    #[test]
    fn test_profile_fields() {
        let profile = UserProfile {
            user_id: 9,
            messages: 12,
            upvotes: 4,
            upvote_rank: Some(2),
            top_channel: Some(RankedEntry { key: 3, count: 10 }),
        };
        let fields = profile_fields(&profile);
        assert_eq!(fields[3], ("Upvote rank", "#2".to_string()));
        assert_eq!(fields[4], ("Most active in", "<#3> (10 messages)".to_string()));

        let fields = profile_fields(&UserProfile::default());
        assert_eq!(fields[3].1, "Unranked");
        assert_eq!(fields[4].1, "Nowhere yet");
    }
}
