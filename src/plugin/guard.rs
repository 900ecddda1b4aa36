use crate::helper::MessageHelper;
use crate::{event::*, plugin::*};
use anyhow::Result;

/// Drops events the bot should never act on: bot-authored messages,
/// messages outside the home guild, and non-admin commands while the bot is
/// in maintenance mode.
pub struct Guard;

#[serenity::async_trait]
impl Plugin for Guard {
    fn name(&self) -> &'static str {
        "guard"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        // Our own messages bear reactions; they are never reacted to or
        // counted.  Other bots get the same treatment.
        if msg.author.bot {
            return Ok(EventHandled::Yes);
        }

        let (home_guild, invite_url, maintenance) = {
            let cfg = ctx.cfg.read().await;
            (
                cfg.general.guild_id,
                cfg.general.invite_url.clone(),
                cfg.general.maintenance,
            )
        };

        // DMs and foreign guilds are not served; point command attempts at
        // the home guild instead
        if msg.guild_id.map(|id| id.get()) != Some(home_guild) {
            if event.has_command_prefix(ctx).await {
                if let Some(invite_url) = invite_url {
                    msg.channel_id.say(ctx.cache_http, invite_url).await?;
                }
            }
            return Ok(EventHandled::Yes);
        }

        if maintenance
            && event.has_command_prefix(ctx).await
            && !msg.is_from_admin(ctx).await
        {
            msg.reply(
                ctx.cache_http,
                "I am being worked on right now x.x Try again later...",
            )
            .await?;
            return Ok(EventHandled::Yes);
        }

        Ok(EventHandled::No)
    }
}
