use crate::helper::MessageHelper;
use crate::{event::*, plugin::*};
use anyhow::Result;

pub struct Help;

#[serenity::async_trait]
impl Plugin for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{} {} - show this help message",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        // The bare prefix also counts as asking for help
        let matched = match event.is_bot_cmd(ctx, self.name()).await {
            Some(matched) => Some(matched),
            None => event.is_bot_cmd(ctx, "").await,
        };
        let Some((msg, _)) = matched else {
            return Ok(EventHandled::No);
        };

        let mut reply = String::new();
        reply.push_str("```\n");
        reply.push_str("Commands:\n");
        for plugin in crate::plugin::plugins() {
            if let Some(usage) = plugin.usage(ctx).await {
                reply.push_str(&usage);
                reply.push('\n');
            }
        }

        if msg.is_from_admin(ctx).await {
            reply.push_str("\nAdmin commands:\n");
            for plugin in crate::plugin::plugins() {
                if let Some(usage) = plugin.admin_usage(ctx).await {
                    reply.push_str(&usage);
                    reply.push('\n');
                }
            }
        }
        reply.push_str("```\n");

        msg.reply(ctx.cache_http, &reply).await?;
        Ok(EventHandled::Yes)
    }
}
