//! Leaderboard rendering: ranked emoji and spammer lines, split into pages
//! that stay under the platform's message-size limit.

use crate::reactions::EmojiPool;
use crate::stats::StatStore;
use serenity::all::UserId;
use std::collections::BTreeMap;

/// Page budgets, with safety margin below the platform's 2000-char cap
pub const EMOJI_PAGE_BUDGET: usize = 1700;
pub const SPAMMER_PAGE_BUDGET: usize = 1900;

/// Accumulate lines into pages of at most `budget` characters.  A page is
/// flushed before the budget would be exceeded; the final page is always
/// flushed, even when empty, so callers can rely on at least one page.
pub fn paginate(lines: &[String], budget: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();

    for line in lines {
        if !current.is_empty() && current.len() + line.len() > budget {
            pages.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }

    pages.push(current);
    pages
}

/// Ranked per-emoji totals in pool order, optionally restricted to a single
/// user.  `None` when there is nothing to rank.
pub fn rank_emojis(
    stats: &StatStore,
    emojis: &EmojiPool,
    user: Option<UserId>,
) -> Option<Vec<String>> {
    let mut totals: BTreeMap<u32, u64> = BTreeMap::new();
    match user {
        Some(user_id) => {
            let record = stats.read_user(user_id)?;
            totals = record.emojis.clone();
        }
        None => {
            for (_, record) in stats.users() {
                for (index, count) in &record.emojis {
                    *totals.entry(*index).or_insert(0) += count;
                }
            }
        }
    }

    let suffix = if user.is_some() { " by you" } else { "" };
    let lines: Vec<String> = emojis
        .iter_indexed()
        .filter_map(|(index, emoji)| {
            let count = totals.get(&index).copied().unwrap_or(0);
            (count > 0).then(|| format!("{} sent {} times{}.\n", emoji, count, suffix))
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(paginate(&lines, EMOJI_PAGE_BUDGET))
}

/// Users ranked by total emoji count, descending.  Ties keep first-seen
/// order, which the store's user table preserves.
pub fn rank_spammers(stats: &StatStore) -> Vec<String> {
    let mut spammers: Vec<(&str, u64)> = stats
        .users()
        .filter_map(|(_, record)| {
            let total = record.total();
            (total > 0).then(|| (record.name.as_str(), total))
        })
        .collect();

    // Stable sort, so equal totals stay in encounter order
    spammers.sort_by(|a, b| b.1.cmp(&a.1));

    let lines: Vec<String> = spammers
        .iter()
        .map(|(name, total)| format!("{} sent {} scowls.\n", name, total))
        .collect();

    paginate(&lines, SPAMMER_PAGE_BUDGET)
}
