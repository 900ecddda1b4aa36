use crate::helper::{group_thousands, MessageHelper};
use crate::stats::Counter;
use crate::{event::*, plugin::*};
use anyhow::Result;

/// Global counter readouts
pub struct Stats;

#[serenity::async_trait]
impl Plugin for Stats {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} stats - all current bot stats\n\
             {} count - total amount of scowl reactions",
            prefix, prefix
        ))
    }

    async fn admin_usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} flushstats - reset every counter and watermark",
            prefix
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        if let Some((msg, _)) = event.is_bot_cmd(ctx, "stats").await {
            let (reactions, tarots, mentions, censors) = {
                let stats = ctx.stats.read().await;
                (
                    stats.read(Counter::ReactionsSent),
                    stats.read(Counter::TarotsRead),
                    stats.read(Counter::MentionEvents),
                    stats.read(Counter::CensorEvents),
                )
            };

            let mut result = format!(
                "I have reacted with {} scowls.\n",
                group_thousands(reactions)
            );
            result += &format!("I have done {} readings.\n", group_thousands(tarots));
            result += &format!(
                "Trigger words have been mentioned {} times.\n",
                group_thousands(mentions)
            );
            result += &format!(
                "A total of {} messages have been censored.\n",
                group_thousands(censors)
            );

            msg.channel_id.say(ctx.cache_http, result).await?;
            return Ok(EventHandled::Yes);
        }

        if let Some((msg, _)) = event.is_bot_cmd(ctx, "count").await {
            let amount = ctx.stats.read().await.read(Counter::ReactionsSent);
            msg.channel_id
                .say(
                    ctx.cache_http,
                    format!(
                        "I have reacted with {} scowls. {}",
                        group_thousands(amount),
                        ctx.emojis.first()
                    ),
                )
                .await?;
            return Ok(EventHandled::Yes);
        }

        // Admin command; for anyone else this falls through to the
        // unknown-command reply
        if let Some((msg, _)) = event.is_bot_cmd(ctx, "flushstats").await {
            if !msg.is_from_admin(ctx).await {
                return Ok(EventHandled::No);
            }

            {
                let mut stats = ctx.stats.write().await;
                stats.reset();
                stats.persist().await;
            }
            msg.channel_id
                .say(ctx.cache_http, "All counters have been reset!")
                .await?;
            return Ok(EventHandled::Yes);
        }

        Ok(EventHandled::No)
    }
}
