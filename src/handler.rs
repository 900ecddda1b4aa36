use crate::{
    config::Config,
    context::Context,
    event::Event,
    fortune::{FortuneCache, FortuneDeck},
    reactions::{CustomReactions, EmojiPool},
    stats::StatStore,
    sweep::RescanLock,
};
use serenity::all::{Message, Ready};
use tokio::sync::RwLock;

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    emojis: EmojiPool,
    deck: FortuneDeck,
    stats: RwLock<StatStore>,
    fortunes: RwLock<FortuneCache>,
    custom: RwLock<CustomReactions>,
    rescan: RescanLock,
}

impl<'a> Handler {
    pub fn new(
        cfg: Config,
        emojis: EmojiPool,
        deck: FortuneDeck,
        stats: StatStore,
        fortunes: FortuneCache,
        custom: CustomReactions,
    ) -> Self {
        Self {
            cfg: RwLock::new(cfg),
            emojis,
            deck,
            stats: RwLock::new(stats),
            fortunes: RwLock::new(fortunes),
            custom: RwLock::new(custom),
            rescan: RescanLock::new(),
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            emojis: &self.emojis,
            deck: &self.deck,
            stats: &self.stats,
            fortunes: &self.fortunes,
            custom: &self.custom,
            rescan: &self.rescan,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }
}
