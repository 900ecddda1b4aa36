use crate::{event::*, plugin::*, report, sweep};
use anyhow::Result;
use serenity::all::{Message, UserId};

/// Leaderboard commands.  Both run an incremental history sweep first so the
/// counters include everything up to the trigger message.
pub struct Leaderboard;

#[serenity::async_trait]
impl Plugin for Leaderboard {
    fn name(&self) -> &'static str {
        "leaderboard"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} emojilist - top scowl emojis, or mention a user for theirs only\n\
             {} topspammer - top scowl spammers",
            prefix, prefix
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        if let Some((msg, _)) = event.is_bot_cmd(ctx, "emojilist").await {
            let target = msg.mentions.first().map(|user| user.id);
            if !refresh_counters(ctx, msg).await? {
                return Ok(EventHandled::Yes);
            }
            return emojilist(ctx, msg, target).await;
        }

        if let Some((msg, _)) = event.is_bot_cmd(ctx, "topspammer").await {
            if !refresh_counters(ctx, msg).await? {
                return Ok(EventHandled::Yes);
            }
            return topspammer(ctx, msg).await;
        }

        Ok(EventHandled::No)
    }
}

/// Sweep all channels under the single-flight gate.  Returns false if a
/// sweep was already in flight, in which case the trigger is rejected with
/// a busy notice rather than queued.
async fn refresh_counters(ctx: &Context<'_>, msg: &Message) -> Result<bool> {
    let Some(guard) = ctx.rescan.try_acquire() else {
        msg.channel_id
            .say(ctx.cache_http, "I am still working...")
            .await?;
        return Ok(false);
    };

    let Some(guild_id) = msg.guild_id else {
        return Ok(false);
    };

    msg.channel_id
        .say(
            ctx.cache_http,
            "Let me go through all new messages real quick...",
        )
        .await?;

    // The guard drops on the error path too; a failed sweep never wedges
    // the leaderboard until restart
    let summary = sweep::run_guild_sweep(ctx, guild_id, &guard).await?;

    msg.channel_id
        .say(
            ctx.cache_http,
            format!("Ok I am done, I went through {} messages.", summary.messages),
        )
        .await?;

    Ok(true)
}

async fn emojilist(ctx: &Context<'_>, msg: &Message, target: Option<UserId>) -> Result<EventHandled> {
    let pages = {
        let stats = ctx.stats.read().await;
        report::rank_emojis(&stats, ctx.emojis, target)
    };

    match pages {
        Some(pages) => send_pages(ctx, msg, pages).await?,
        None => {
            let notice = if target.is_some() {
                "That user has not sent any scowls yet."
            } else {
                "No scowls have been counted yet."
            };
            msg.channel_id.say(ctx.cache_http, notice).await?;
        }
    }

    Ok(EventHandled::Yes)
}

async fn topspammer(ctx: &Context<'_>, msg: &Message) -> Result<EventHandled> {
    let pages = {
        let stats = ctx.stats.read().await;
        report::rank_spammers(&stats)
    };

    if pages.concat().is_empty() {
        msg.channel_id
            .say(ctx.cache_http, "No scowls have been counted yet.")
            .await?;
        return Ok(EventHandled::Yes);
    }

    send_pages(ctx, msg, pages).await?;
    Ok(EventHandled::Yes)
}

/// The reporter always flushes a trailing page, which may be empty; the
/// platform rejects empty messages, so those are skipped here.
async fn send_pages(ctx: &Context<'_>, msg: &Message, pages: Vec<String>) -> Result<()> {
    for page in pages {
        if !page.is_empty() {
            msg.channel_id.say(ctx.cache_http, page).await?;
        }
    }
    Ok(())
}
