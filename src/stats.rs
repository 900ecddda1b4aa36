//! Durable usage counters: global counters, per-user emoji tallies, and the
//! per-channel watermarks that bound incremental history sweeps.

use crate::log_internal;
use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use serenity::all::{ChannelId, MessageId, UserId};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const STATS_FILE: &str = "stats.json";

/// Global counters tracked by the bot
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum Counter {
    ReactionsSent,
    TarotsRead,
    CensorEvents,
    MentionEvents,
}

/// Per-user tallies.  Emoji counts are keyed by the 1-based index of the
/// emoji within the configured pool.
#[derive(serde::Serialize, serde::Deserialize, Clone, Default, Debug)]
pub struct UserRecord {
    pub name: String,
    pub emojis: BTreeMap<u32, u64>,
}

impl UserRecord {
    pub fn total(&self) -> u64 {
        self.emojis.values().sum()
    }
}

/// The serialized snapshot.  `users` keeps first-seen order so leaderboard
/// ties rank in encounter order.
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct Snapshot {
    #[serde(default)]
    counters: HashMap<Counter, u64>,
    #[serde(default)]
    users: IndexMap<UserId, UserRecord>,
    #[serde(default)]
    watermarks: HashMap<ChannelId, MessageId>,
}

/// Counter store, loaded once at startup and written back after each
/// mutation batch.
pub struct StatStore {
    path: PathBuf,
    data: Snapshot,
}

impl StatStore {
    #[cfg(test)]
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            data: Snapshot::default(),
        }
    }

    /// Load the snapshot from `path`.  A missing or unreadable file is not
    /// fatal; the bot degrades to a cold start with empty counters.
    pub async fn load(path: PathBuf) -> Self {
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(err) => {
                    log_internal!(
                        "Could not parse stats at `{}`, starting empty: {}",
                        path.to_string_lossy(),
                        err
                    );
                    Snapshot::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(err) => {
                log_internal!(
                    "Could not read stats at `{}`, starting empty: {}",
                    path.to_string_lossy(),
                    err
                );
                Snapshot::default()
            }
        };

        Self { path, data }
    }

    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.data)
            .map_err(|e| anyhow!("Could not serialize stats: {}", e))?;
        write_atomically(&self.path, &contents).await
    }

    /// Save, logging and swallowing failure.  The in-memory state stays
    /// authoritative until the next successful write.
    pub async fn persist(&self) {
        if let Err(err) = self.save().await {
            log_internal!("Could not persist stats: {}", err);
        }
    }

    pub fn increment(&mut self, counter: Counter, amount: u64) {
        *self.data.counters.entry(counter).or_insert(0) += amount;
    }

    pub fn increment_user(&mut self, user_id: UserId, name: &str, emoji_index: u32, amount: u64) {
        let record = self.data.users.entry(user_id).or_default();
        record.name = name.to_owned();
        *record.emojis.entry(emoji_index).or_insert(0) += amount;
    }

    pub fn read(&self, counter: Counter) -> u64 {
        self.data.counters.get(&counter).copied().unwrap_or(0)
    }

    pub fn read_user(&self, user_id: UserId) -> Option<&UserRecord> {
        self.data.users.get(&user_id)
    }

    /// All user records, in the order they were first seen
    pub fn users(&self) -> impl Iterator<Item = (&UserId, &UserRecord)> {
        self.data.users.iter()
    }

    /// Admin-triggered flush of every counter and watermark
    pub fn reset(&mut self) {
        self.data = Snapshot::default();
    }

    pub fn watermark(&self, channel_id: ChannelId) -> Option<MessageId> {
        self.data.watermarks.get(&channel_id).copied()
    }

    /// No ordering check here; the sweep only ever passes the newest id of a
    /// fully fetched and folded channel scan.
    pub fn set_watermark(&mut self, channel_id: ChannelId, message_id: MessageId) {
        self.data.watermarks.insert(channel_id, message_id);
    }
}

/// Write via a temporary file in the same directory, then rename over the
/// target, so a crash mid-write never truncates the previous snapshot.
pub async fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            anyhow!(
                "Could not create directory `{}`: {}",
                parent.to_string_lossy(),
                e
            )
        })?;
    }

    let tmp_path = path.with_extension("json.new");

    tokio::fs::write(&tmp_path, contents).await.map_err(|e| {
        anyhow!(
            "Could not write temporary file `{}`: {}",
            tmp_path.to_string_lossy(),
            e
        )
    })?;

    tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
        anyhow!(
            "Could not rename temporary file `{}` to `{}`: {}",
            tmp_path.to_string_lossy(),
            path.to_string_lossy(),
            e
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_store() -> StatStore {
        StatStore::empty(PathBuf::from("unused.json"))
    }

    #[test]
    fn counters_accumulate() {
        let mut store = empty_store();
        assert_eq!(store.read(Counter::ReactionsSent), 0);

        store.increment(Counter::ReactionsSent, 5);
        store.increment(Counter::ReactionsSent, 2);
        assert_eq!(store.read(Counter::ReactionsSent), 7);
        assert_eq!(store.read(Counter::TarotsRead), 0);
    }

    #[test]
    fn user_records_track_name_and_emoji_counts() {
        let mut store = empty_store();
        let user = UserId::new(42);

        store.increment_user(user, "alice", 1, 3);
        store.increment_user(user, "alice2", 1, 1);
        store.increment_user(user, "alice2", 7, 2);

        let record = store.read_user(user).unwrap();
        assert_eq!(record.name, "alice2");
        assert_eq!(record.emojis.get(&1), Some(&4));
        assert_eq!(record.emojis.get(&7), Some(&2));
        assert_eq!(record.total(), 6);
        assert!(store.read_user(UserId::new(99)).is_none());
    }

    #[test]
    fn users_iterate_in_first_seen_order() {
        let mut store = empty_store();
        store.increment_user(UserId::new(3), "c", 1, 1);
        store.increment_user(UserId::new(1), "a", 1, 1);
        store.increment_user(UserId::new(2), "b", 1, 1);
        store.increment_user(UserId::new(1), "a", 2, 1);

        let order: Vec<&str> = store.users().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = empty_store();
        store.increment(Counter::TarotsRead, 3);
        store.increment_user(UserId::new(1), "a", 1, 1);
        store.set_watermark(ChannelId::new(10), MessageId::new(20));

        store.reset();
        assert_eq!(store.read(Counter::TarotsRead), 0);
        assert!(store.read_user(UserId::new(1)).is_none());
        assert!(store.watermark(ChannelId::new(10)).is_none());
    }

    #[test]
    fn snapshot_layout_uses_kebab_counter_names_and_indexed_emojis() {
        let mut store = empty_store();
        store.increment(Counter::CensorEvents, 2);
        store.increment_user(UserId::new(5), "eve", 3, 9);

        let json = serde_json::to_value(&store.data).unwrap();
        assert_eq!(json["counters"]["censor-events"], 2);
        assert_eq!(json["users"]["5"]["name"], "eve");
        assert_eq!(json["users"]["5"]["emojis"]["3"], 9);
    }

    #[tokio::test]
    async fn snapshot_roundtrips_through_disk() {
        let path = std::env::temp_dir().join(format!("scowlbot-stats-{}.json", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let mut store = StatStore::load(path.clone()).await;
        store.increment(Counter::MentionEvents, 4);
        store.increment_user(UserId::new(7), "mallory", 2, 6);
        store.set_watermark(ChannelId::new(11), MessageId::new(1234));
        store.save().await.unwrap();

        let reloaded = StatStore::load(path.clone()).await;
        assert_eq!(reloaded.read(Counter::MentionEvents), 4);
        assert_eq!(reloaded.read_user(UserId::new(7)).unwrap().total(), 6);
        assert_eq!(
            reloaded.watermark(ChannelId::new(11)),
            Some(MessageId::new(1234))
        );

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_snapshot_degrades_to_empty() {
        let path = std::env::temp_dir().join("scowlbot-stats-definitely-missing.json");
        let store = StatStore::load(path).await;
        assert_eq!(store.read(Counter::ReactionsSent), 0);
        assert_eq!(store.users().count(), 0);
    }
}
