mod aggregate;
mod config;
mod context;
mod event;
mod fortune;
mod handler;
mod helper;
mod logging;
mod plugin;
mod reactions;
mod report;
mod stats;
mod sweep;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::Config::load().await?;
    let token = cfg.general.discord_token.clone();

    // Required before the first event; failure here is fatal
    let emojis = reactions::EmojiPool::load(config::config_path(reactions::EMOJIS_FILE)?).await?;
    let deck = fortune::FortuneDeck::load(config::config_path(fortune::FORTUNES_FILE)?).await?;

    // Persisted state degrades to a cold start when missing or corrupt
    let stats = stats::StatStore::load(config::config_path(stats::STATS_FILE)?).await;
    let fortunes = fortune::FortuneCache::load(
        config::config_path(fortune::FORTUNE_CACHE_FILE)?,
        chrono::Local::now(),
    )
    .await;
    let custom =
        reactions::CustomReactions::load(config::config_path(reactions::CUSTOM_REACTIONS_FILE)?)
            .await;

    let handler = handler::Handler::new(cfg, emojis, deck, stats, fortunes, custom);

    // Things we want discord to tell us about.
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
