use anyhow::Result;

pub use crate::context::Context;
pub use crate::event::EventHandled;

mod censor;
mod debug;
mod guard;
mod help;
mod leaderboard;
mod mention;
mod react;
mod ready;
mod stats;
mod tarot;
mod unknown;
mod update_reactions;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context<'_>) -> Option<String>;
    /// Help message line for admin-gated commands, if any
    async fn admin_usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context<'_>, event: &crate::event::Event)
        -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    use crate::plugin::*;

    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ready::ReadyStatus),
        Box::new(guard::Guard),
        // Passive message behavior
        Box::new(mention::Mention),
        Box::new(censor::Censor),
        // Commands
        Box::new(help::Help),
        Box::new(tarot::Tarot),
        Box::new(stats::Stats),
        Box::new(leaderboard::Leaderboard),
        Box::new(update_reactions::UpdateReactions),
        Box::new(unknown::Unknown),
        // Reacts to whatever remains.  Keep last.
        Box::new(react::React),
    ]
}
