use crate::helper::MessageHelper;
use crate::{event::*, plugin::*};
use anyhow::Result;

/// Hot-reloads the custom reaction table while the bot is running
pub struct UpdateReactions;

#[serenity::async_trait]
impl Plugin for UpdateReactions {
    fn name(&self) -> &'static str {
        "updatereactions"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn admin_usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} {} - reload the custom reaction table",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        if !msg.is_from_admin(ctx).await {
            return Ok(EventHandled::No);
        }

        // A broken file keeps the previous table; the reload logs the
        // failure itself
        ctx.custom.write().await.reload().await;
        msg.reply(ctx.cache_http, "Custom reactions updated").await?;

        Ok(EventHandled::Yes)
    }
}
