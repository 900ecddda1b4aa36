//! The daily fortune: a per-user draw from a pool of canned texts, stable
//! until local midnight and persisted so restarts don't re-deal.

use crate::log_internal;
use crate::stats::write_atomically;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Days, Local, LocalResult, NaiveDate, NaiveTime};
use serenity::all::UserId;
use std::collections::HashMap;
use std::path::PathBuf;

pub const FORTUNES_FILE: &str = "fortunes.json";
pub const FORTUNE_CACHE_FILE: &str = "fortune-cache.json";

/// Placeholder in fortune texts, substituted with the drawn pool emoji
const EMOJI_PLACEHOLDER: &str = ":emoji:";

/// The fixed pool of fortune texts.  Required before the first event, so a
/// load failure is fatal at startup.
pub struct FortuneDeck(Vec<FortuneText>);

#[derive(serde::Serialize, serde::Deserialize)]
pub struct FortuneText {
    pub text: String,
}

impl FortuneDeck {
    pub async fn load(path: PathBuf) -> Result<Self> {
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            anyhow!(
                "Could not read fortune texts at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let texts: Vec<FortuneText> = serde_json::from_slice(&bytes).map_err(|e| {
            anyhow!(
                "Could not parse fortune texts at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        if texts.is_empty() {
            return Err(anyhow!(
                "Fortune texts at `{}` are empty",
                path.to_string_lossy()
            ));
        }

        Ok(Self(texts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Fortune text at `index` with the emoji placeholder filled in
    pub fn render(&self, index: usize, emoji: &str) -> Option<String> {
        self.0
            .get(index)
            .map(|fortune| fortune.text.replace(EMOJI_PLACEHOLDER, emoji))
    }
}

/// One user's draw for the day
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug)]
pub struct FortuneEntry {
    pub tarot: usize,
    pub timestamp: i64,
}

/// Per-user daily draws, persisted on every assignment
pub struct FortuneCache {
    path: PathBuf,
    entries: HashMap<UserId, FortuneEntry>,
}

impl FortuneCache {
    /// Load the cache, discarding entries from previous days.  Missing or
    /// corrupt files degrade to an empty cache.
    pub async fn load(path: PathBuf, now: DateTime<Local>) -> Self {
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<UserId, FortuneEntry>>(&bytes) {
                Ok(entries) => {
                    let (day_start, day_end) = day_bounds(now);
                    entries
                        .into_iter()
                        .filter(|(_, e)| e.timestamp >= day_start && e.timestamp < day_end)
                        .collect()
                }
                Err(err) => {
                    log_internal!(
                        "Could not parse fortune cache at `{}`, starting empty: {}",
                        path.to_string_lossy(),
                        err
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                log_internal!(
                    "Could not read fortune cache at `{}`, starting empty: {}",
                    path.to_string_lossy(),
                    err
                );
                HashMap::new()
            }
        };

        Self { path, entries }
    }

    /// Re-read the cache file, replacing the in-memory entries
    pub async fn reload(&mut self, now: DateTime<Local>) {
        let fresh = Self::load(self.path.clone(), now).await;
        self.entries = fresh.entries;
    }

    /// The user's draw for the day containing `now`, if one exists
    pub fn fresh(&self, user_id: UserId, now: DateTime<Local>) -> Option<FortuneEntry> {
        let (day_start, day_end) = day_bounds(now);
        self.entries
            .get(&user_id)
            .filter(|e| e.timestamp >= day_start && e.timestamp < day_end)
            .copied()
    }

    pub fn assign(&mut self, user_id: UserId, tarot: usize, now: DateTime<Local>) -> FortuneEntry {
        let entry = FortuneEntry {
            tarot,
            timestamp: now.timestamp_millis(),
        };
        self.entries.insert(user_id, entry);
        entry
    }

    /// Admin flush of every stored draw
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| anyhow!("Could not serialize fortune cache: {}", e))?;
        write_atomically(&self.path, &contents).await
    }

    /// Save, logging and swallowing failure
    pub async fn persist(&self) {
        if let Err(err) = self.save().await {
            log_internal!("Could not persist fortune cache: {}", err);
        }
    }
}

/// Millisecond bounds `[start, end)` of the local calendar day containing
/// `now`
pub fn day_bounds(now: DateTime<Local>) -> (i64, i64) {
    let date = now.date_naive();
    let start = local_midnight_millis(date, now);
    let end = date
        .checked_add_days(Days::new(1))
        .map(|next| local_midnight_millis(next, now))
        .unwrap_or(start);
    (start, end)
}

/// Minutes until the next local midnight, i.e. until a new draw is allowed
pub fn minutes_until_new_draw(now: DateTime<Local>) -> i64 {
    let (_, day_end) = day_bounds(now);
    (day_end - now.timestamp_millis()) / 60_000
}

fn local_midnight_millis(date: NaiveDate, fallback: DateTime<Local>) -> i64 {
    // DST transitions can make a local midnight ambiguous or nonexistent
    match date.and_time(NaiveTime::MIN).and_local_timezone(Local) {
        LocalResult::Single(t) => t.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => fallback.timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn empty_cache() -> FortuneCache {
        FortuneCache {
            path: PathBuf::from("unused.json"),
            entries: HashMap::new(),
        }
    }

    #[test]
    fn same_day_lookup_returns_the_assigned_draw() {
        let mut cache = empty_cache();
        let user = UserId::new(1);
        let now = Local::now();

        assert!(cache.fresh(user, now).is_none());
        cache.assign(user, 42, now);

        let entry = cache.fresh(user, now).expect("assigned today");
        assert_eq!(entry.tarot, 42);

        // A second same-day lookup must return the identical draw
        let again = cache.fresh(user, now).expect("still assigned");
        assert_eq!(again.tarot, 42);
    }

    #[test]
    fn next_day_lookup_misses_so_a_new_draw_is_possible() {
        let mut cache = empty_cache();
        let user = UserId::new(1);
        let now = Local::now();

        cache.assign(user, 42, now);
        let tomorrow = now + Duration::days(1);
        assert!(cache.fresh(user, tomorrow).is_none());

        cache.assign(user, 7, tomorrow);
        assert_eq!(cache.fresh(user, tomorrow).unwrap().tarot, 7);
    }

    #[test]
    fn yesterdays_draw_is_not_fresh_today() {
        let mut cache = empty_cache();
        let user = UserId::new(1);
        let now = Local::now();

        cache.assign(user, 3, now - Duration::days(1));
        assert!(cache.fresh(user, now).is_none());
    }

    #[test]
    fn clear_drops_all_draws() {
        let mut cache = empty_cache();
        let now = Local::now();
        cache.assign(UserId::new(1), 1, now);
        cache.assign(UserId::new(2), 2, now);

        cache.clear();
        assert!(cache.fresh(UserId::new(1), now).is_none());
        assert!(cache.fresh(UserId::new(2), now).is_none());
    }

    #[test]
    fn day_bounds_bracket_now() {
        let now = Local::now();
        let (start, end) = day_bounds(now);
        let millis = now.timestamp_millis();
        assert!(start <= millis);
        assert!(millis < end);
        // A calendar day is at most 25 hours across DST transitions
        assert!(end - start <= 25 * 3600 * 1000);
    }

    #[test]
    fn minutes_until_new_draw_is_within_a_day() {
        let minutes = minutes_until_new_draw(Local::now());
        assert!(minutes >= 0);
        assert!(minutes <= 25 * 60);
    }

    #[tokio::test]
    async fn stale_entries_are_discarded_on_load() {
        let path = std::env::temp_dir().join(format!(
            "scowlbot-fortune-cache-{}.json",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&path).await;
        let now = Local::now();

        let mut cache = FortuneCache {
            path: path.clone(),
            entries: HashMap::new(),
        };
        cache.assign(UserId::new(1), 10, now);
        cache.assign(UserId::new(2), 20, now - Duration::days(2));
        cache.save().await.unwrap();

        let reloaded = FortuneCache::load(path.clone(), now).await;
        assert_eq!(reloaded.fresh(UserId::new(1), now).unwrap().tarot, 10);
        assert!(reloaded.entries.get(&UserId::new(2)).is_none());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn deck_renders_placeholder() {
        let deck = FortuneDeck(vec![FortuneText {
            text: "Today you radiate :emoji: energy".to_owned(),
        }]);
        assert_eq!(
            deck.render(0, "<:scowl1:1>").unwrap(),
            "Today you radiate <:scowl1:1> energy"
        );
        assert!(deck.render(1, "x").is_none());
    }
}
