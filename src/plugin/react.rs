use crate::stats::Counter;
use crate::{event::*, plugin::*};
use anyhow::{anyhow, Result};
use serenity::all::{Message, ReactionType};

/// Reacts to every remaining message: a user's custom reactions if they
/// have any, the default pool prefix otherwise.  Keep last.
pub struct React;

#[serenity::async_trait]
impl Plugin for React {
    fn name(&self) -> &'static str {
        "react"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        let custom = ctx.custom.read().await.get(msg.author.id).cloned();

        let applied = match custom {
            Some(custom) => {
                for emoji in &custom.reactions {
                    react_with(ctx, msg, emoji).await?;
                }
                if let Some(reply) = &custom.reply {
                    msg.reply(ctx.cache_http, reply).await?;
                }
                custom.reactions.len()
            }
            None => {
                let count = ctx
                    .cfg
                    .read()
                    .await
                    .general
                    .reaction_count
                    .min(ctx.emojis.len());
                for index in 0..count {
                    if let Some(emoji) = ctx.emojis.get(index) {
                        react_with(ctx, msg, emoji).await?;
                    }
                }
                count
            }
        };

        if applied > 0 {
            let mut stats = ctx.stats.write().await;
            stats.increment(Counter::ReactionsSent, applied as u64);
            stats.persist().await;
        }

        Ok(EventHandled::Yes)
    }
}

async fn react_with(ctx: &Context<'_>, msg: &Message, emoji: &str) -> Result<()> {
    let reaction = ReactionType::try_from(emoji)
        .map_err(|_| anyhow!("Invalid reaction emoji `{}`", emoji))?;
    msg.react(ctx.cache_http, reaction).await?;
    Ok(())
}
