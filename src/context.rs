use crate::{
    config::Config,
    fortune::{FortuneCache, FortuneDeck},
    reactions::{CustomReactions, EmojiPool},
    stats::StatStore,
    sweep::RescanLock,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collection of data that is shared across events
pub struct Context<'a> {
    // Scowlbot's own context types
    pub cfg: &'a RwLock<Config>,
    pub emojis: &'a EmojiPool,
    pub deck: &'a FortuneDeck,
    pub stats: &'a RwLock<StatStore>,
    pub fortunes: &'a RwLock<FortuneCache>,
    pub custom: &'a RwLock<CustomReactions>,
    pub rescan: &'a RescanLock,
    // Discord/Serenity context types
    pub cache: &'a Arc<serenity::all::Cache>,
    pub http: &'a Arc<serenity::all::Http>,
    pub cache_http: &'a CacheHttp,
}

/// Many Serenity functions take a `impl CacheHttp` in order to first check the cache if the item
/// is available and fall back to an http request otherwise.  The most readily available type that
/// impl's this is named very differently in a way that could be confusing, and so we alias it.
pub type CacheHttp = serenity::all::Context;
