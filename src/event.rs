//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! this module translates the callbacks to a distinct Event enum.

use crate::context::Context;
use serenity::all::{Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => eprintln!("Error in plugin {}: {}", plugin.name(), err),
            }
        }
    }

    /// Check if a message is the given bot command: the configured prefix
    /// word followed by the command word, e.g. `?scowl tarot`.  Returns the
    /// message and the remaining argument tokens.
    ///
    /// The bare prefix with no command word matches `cmd == ""`.
    pub async fn is_bot_cmd<'a>(
        &'a self,
        ctx: &Context<'_>,
        cmd: &str,
    ) -> Option<(&'a Message, Vec<&'a str>)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        let mut tokens = msg.content.split_whitespace();
        if tokens.next() != Some(prefix.as_str()) {
            return None;
        }

        let name = tokens.next().unwrap_or("");
        if !name.eq_ignore_ascii_case(cmd) {
            return None;
        }

        Some((msg, tokens.collect()))
    }

    /// Whether the message begins with the command prefix at all
    pub async fn has_command_prefix(&self, ctx: &Context<'_>) -> bool {
        let Event::Message(msg) = self else {
            return false;
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        msg.content.split_whitespace().next() == Some(prefix.as_str())
    }
}

pub enum EventHandled {
    Yes,
    No,
}
