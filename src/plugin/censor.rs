use crate::stats::Counter;
use crate::{event::*, log_internal, plugin::*};
use anyhow::Result;

/// Deletes messages containing forbidden emojis and replies with a censored
/// copy
pub struct Censor;

#[serenity::async_trait]
impl Plugin for Censor {
    fn name(&self) -> &'static str {
        "censor"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        let forbidden = ctx.cfg.read().await.censor.forbidden.clone();
        if !forbidden
            .iter()
            .any(|emoji| msg.content.contains(emoji.as_str()))
        {
            return Ok(EventHandled::No);
        }

        // Escape backslashes so the quoted copy can't smuggle markup
        let mut censored = msg.content.replace('\\', "\\ ");
        for emoji in &forbidden {
            censored = censored.replace(emoji.as_str(), "`CENSORED` ");
        }

        msg.reply(ctx.cache_http, format!("{}\nThat is illegal!", censored))
            .await?;

        if let Err(err) = msg.delete(ctx.cache_http).await {
            log_internal!("Could not delete censored message: {}", err);
        }

        {
            let mut stats = ctx.stats.write().await;
            stats.increment(Counter::CensorEvents, 1);
            stats.persist().await;
        }

        Ok(EventHandled::Yes)
    }
}
