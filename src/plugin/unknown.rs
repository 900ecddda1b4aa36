use crate::{event::*, plugin::*};
use anyhow::Result;

/// Catches prefixed messages no command plugin claimed.  Keep after every
/// command plugin.
pub struct Unknown;

#[serenity::async_trait]
impl Plugin for Unknown {
    fn name(&self) -> &'static str {
        "unknown"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        if !event.has_command_prefix(ctx).await {
            return Ok(EventHandled::No);
        }

        msg.reply(ctx.cache_http, "That is not a command I know of 🥴")
            .await?;
        Ok(EventHandled::Yes)
    }
}
