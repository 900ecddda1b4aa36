use crate::stats::Counter;
use crate::{event::*, plugin::*};
use anyhow::Result;

/// Replies with a canned line whenever a configured trigger word shows up
pub struct Mention;

#[serenity::async_trait]
impl Plugin for Mention {
    fn name(&self) -> &'static str {
        "mention"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        let (trigger_words, reply) = {
            let cfg = ctx.cfg.read().await;
            (cfg.mention.trigger_words.clone(), cfg.mention.reply.clone())
        };

        let content = msg.content.to_lowercase();
        if !trigger_words
            .iter()
            .any(|word| content.contains(&word.to_lowercase()))
        {
            return Ok(EventHandled::No);
        }

        msg.reply(ctx.cache_http, reply).await?;

        {
            let mut stats = ctx.stats.write().await;
            stats.increment(Counter::MentionEvents, 1);
            stats.persist().await;
        }

        // The message still gets its reactions
        Ok(EventHandled::No)
    }
}
