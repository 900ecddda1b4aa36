//! Reaction configuration: the ordered pool of scowl emojis and the
//! per-user custom reaction table.

use crate::log_internal;
use anyhow::{anyhow, Result};
use serenity::all::UserId;
use std::collections::HashMap;
use std::path::PathBuf;

pub const EMOJIS_FILE: &str = "emojis.json";
pub const CUSTOM_REACTIONS_FILE: &str = "custom-reactions.json";

/// The ordered emoji pool.  Indices are 1-based everywhere they are stored
/// or displayed; the pool itself is a plain zero-based list on disk.
pub struct EmojiPool(pub Vec<String>);

impl EmojiPool {
    /// Required before the first event, so a load failure is fatal.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            anyhow!(
                "Could not read emoji pool at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let emojis: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| {
            anyhow!(
                "Could not parse emoji pool at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        if emojis.is_empty() {
            return Err(anyhow!(
                "Emoji pool at `{}` is empty",
                path.to_string_lossy()
            ));
        }

        Ok(Self(emojis))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    /// Emoji at a zero-based position
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// `(1-based index, emoji)` pairs in pool order
    pub fn iter_indexed(&self) -> impl Iterator<Item = (u32, &str)> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, emoji)| (i as u32 + 1, emoji.as_str()))
    }
}

/// A user's reaction override: these reactions are applied instead of the
/// default pool prefix, with an optional canned reply.
#[derive(serde::Serialize, serde::Deserialize, Clone)]
pub struct CustomReaction {
    pub reactions: Vec<String>,
    #[serde(default)]
    pub reply: Option<String>,
}

/// Per-user custom reactions, hot-reloadable while the bot runs
pub struct CustomReactions {
    path: PathBuf,
    map: HashMap<UserId, CustomReaction>,
}

impl CustomReactions {
    /// Initial load.  Failure is not fatal; the bot starts with no custom
    /// reactions and an admin can `updatereactions` once the file is fixed.
    pub async fn load(path: PathBuf) -> Self {
        let mut custom = Self {
            path,
            map: HashMap::new(),
        };
        custom.reload().await;
        custom
    }

    /// Re-read the table.  On failure the previous in-memory table is
    /// retained.
    pub async fn reload(&mut self) {
        match Self::read(&self.path).await {
            Ok(map) => self.map = map,
            Err(err) => log_internal!(
                "Could not reload custom reactions from `{}`: {}",
                self.path.to_string_lossy(),
                err
            ),
        }
    }

    async fn read(path: &PathBuf) -> Result<HashMap<UserId, CustomReaction>> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn get(&self, user_id: UserId) -> Option<&CustomReaction> {
        self.map.get(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_iteration_is_one_based_and_ordered() {
        let pool = EmojiPool(vec!["a".into(), "b".into(), "c".into()]);
        let indexed: Vec<(u32, &str)> = pool.iter_indexed().collect();
        assert_eq!(indexed, [(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(pool.get(0), Some("a"));
        assert_eq!(pool.get(3), None);
    }

    #[tokio::test]
    async fn reload_failure_retains_previous_table() {
        let path = std::env::temp_dir().join(format!(
            "scowlbot-custom-reactions-{}.json",
            std::process::id()
        ));

        tokio::fs::write(
            &path,
            r#"{"5": {"reactions": ["<:scowl1:1>"], "reply": "hi"}}"#,
        )
        .await
        .unwrap();
        let mut custom = CustomReactions::load(path.clone()).await;
        assert!(custom.get(UserId::new(5)).is_some());

        tokio::fs::write(&path, "not json").await.unwrap();
        custom.reload().await;
        assert!(
            custom.get(UserId::new(5)).is_some(),
            "broken file must not wipe the working table"
        );

        let _ = tokio::fs::remove_file(&path).await;
    }
}
