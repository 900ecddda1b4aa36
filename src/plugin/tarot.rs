use crate::fortune::minutes_until_new_draw;
use crate::helper::{group_thousands, MessageHelper};
use crate::stats::Counter;
use crate::{event::*, plugin::*};
use anyhow::Result;
use chrono::Local;
use rand::Rng;
use serenity::all::Message;
use std::time::Duration;

pub struct Tarot;

#[serenity::async_trait]
impl Plugin for Tarot {
    fn name(&self) -> &'static str {
        "tarot"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} tarot - get your daily scowl reading\n\
             {} tarotcount - see how many readings I have done",
            prefix, prefix
        ))
    }

    async fn admin_usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} flushtarot - clear all saved readings\n\
             {} loadtarot - reload saved readings from disk",
            prefix, prefix
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        if let Some((msg, _)) = event.is_bot_cmd(ctx, "tarot").await {
            return daily_reading(ctx, msg).await;
        }

        if let Some((msg, _)) = event.is_bot_cmd(ctx, "tarotcount").await {
            let amount = ctx.stats.read().await.read(Counter::TarotsRead);
            msg.channel_id
                .say(
                    ctx.cache_http,
                    format!("I have done {} readings.", group_thousands(amount)),
                )
                .await?;
            return Ok(EventHandled::Yes);
        }

        // Admin commands; for anyone else these fall through to the
        // unknown-command reply
        if let Some((msg, _)) = event.is_bot_cmd(ctx, "flushtarot").await {
            if !msg.is_from_admin(ctx).await {
                return Ok(EventHandled::No);
            }

            {
                let mut fortunes = ctx.fortunes.write().await;
                fortunes.clear();
                fortunes.persist().await;
            }
            msg.channel_id
                .say(ctx.cache_http, "All saved readings have been cleared!")
                .await?;
            return Ok(EventHandled::Yes);
        }

        if let Some((msg, _)) = event.is_bot_cmd(ctx, "loadtarot").await {
            if !msg.is_from_admin(ctx).await {
                return Ok(EventHandled::No);
            }

            ctx.fortunes.write().await.reload(Local::now()).await;
            msg.channel_id
                .say(ctx.cache_http, "I have loaded all saved readings")
                .await?;
            return Ok(EventHandled::Yes);
        }

        Ok(EventHandled::No)
    }
}

async fn daily_reading(ctx: &Context<'_>, msg: &Message) -> Result<EventHandled> {
    let now = Local::now();
    let existing = ctx.fortunes.read().await.fresh(msg.author.id, now);

    // A reading holds until local midnight
    if let Some(entry) = existing {
        let emoji = pool_emoji(ctx, entry.tarot);
        let text = ctx.deck.render(entry.tarot, emoji).unwrap_or_default();
        msg.reply(
            ctx.cache_http,
            format!(
                "I already told you, your scowl today is {}.\n{}\n\n\
                 You can get a new one tomorrow (in {} minutes).",
                emoji,
                text,
                minutes_until_new_draw(now)
            ),
        )
        .await?;
        return Ok(EventHandled::Yes);
    }

    msg.reply(ctx.cache_http, "Let me sense your scowl...").await?;

    let draw = rand::thread_rng().gen_range(0..ctx.deck.len());

    {
        let mut fortunes = ctx.fortunes.write().await;
        fortunes.assign(msg.author.id, draw, now);
        fortunes.persist().await;
    }
    {
        let mut stats = ctx.stats.write().await;
        stats.increment(Counter::TarotsRead, 1);
        stats.persist().await;
    }

    // A little suspense before the reveal
    tokio::time::sleep(Duration::from_secs(2)).await;

    let emoji = pool_emoji(ctx, draw);
    let text = ctx.deck.render(draw, emoji).unwrap_or_default();
    msg.reply(
        ctx.cache_http,
        format!("Your scowl today is {}\n\n{}", emoji, text),
    )
    .await?;

    Ok(EventHandled::Yes)
}

/// Pool emoji matching a deck index.  A deck larger than the pool falls
/// back to the first emoji.
fn pool_emoji<'a>(ctx: &'a Context<'_>, index: usize) -> &'a str {
    ctx.emojis.get(index).unwrap_or_else(|| ctx.emojis.first())
}
