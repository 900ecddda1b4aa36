//! The history sweep: walks every text channel of the home guild, fetches
//! messages newer than the stored watermark (or all of them on first
//! contact), and folds the result into the counter store.
//!
//! The sweep is expensive and not reentrant against the watermark table, so
//! it is serialized process-wide by [`RescanLock`].  Concurrent triggers are
//! rejected, never queued.

use crate::context::Context;
use crate::logging::AsyncPrintColor;
use crate::{aggregate, log_internal};
use anyhow::Result;
use serenity::all::{ChannelId, ChannelType, GetMessages, GuildId, MessageId, UserId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Platform-imposed ceiling on messages per history call
pub const PAGE_LIMIT: u8 = 100;

/// The slice of a platform message the sweep cares about
#[derive(Clone, Debug)]
pub struct ScannedMessage {
    pub id: MessageId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
}

#[derive(Clone, Copy, Debug)]
pub enum PageBound {
    /// Newest messages in the channel
    Latest,
    /// Messages older than the given id
    Before(MessageId),
    /// Messages newer than the given id
    After(MessageId),
}

/// One page of channel history.  Abstracted from the platform client so the
/// paging logic is testable against a fake.
#[serenity::async_trait]
pub trait MessagePager: Sync {
    async fn fetch_page(&self, bound: PageBound, limit: u8) -> Result<Vec<ScannedMessage>>;
}

/// The real pager, backed by the platform's channel history API
pub struct ChannelPager<'a> {
    pub channel_id: ChannelId,
    pub cache_http: &'a crate::context::CacheHttp,
}

#[serenity::async_trait]
impl MessagePager for ChannelPager<'_> {
    async fn fetch_page(&self, bound: PageBound, limit: u8) -> Result<Vec<ScannedMessage>> {
        let mut builder = GetMessages::new().limit(limit);
        builder = match bound {
            PageBound::Latest => builder,
            PageBound::Before(id) => builder.before(id),
            PageBound::After(id) => builder.after(id),
        };

        let messages = self.channel_id.messages(self.cache_http, builder).await?;
        Ok(messages
            .into_iter()
            .map(|msg| ScannedMessage {
                id: msg.id,
                author_id: msg.author.id,
                author_name: msg.author.name.clone(),
                content: msg.content,
            })
            .collect())
    }
}

/// Fetch every message in the channel newer than `after`, or the whole
/// history when `after` is absent.  The bot's own messages are excluded from
/// the result; they bear reactions but are never counted.
///
/// Pages that fail abort the fetch with an error, so a partial sweep never
/// reaches the watermark.
pub async fn fetch_since<P: MessagePager>(
    pager: &P,
    own_id: UserId,
    after: Option<MessageId>,
) -> Result<Vec<ScannedMessage>> {
    match after {
        Some(after) => collect_newer(pager, own_id, after).await,
        None => collect_all(pager, own_id).await,
    }
}

/// Full scan: page backward from the newest message until a short page
/// signals exhaustion.
async fn collect_all<P: MessagePager>(pager: &P, own_id: UserId) -> Result<Vec<ScannedMessage>> {
    let mut collected = Vec::new();
    let mut bound = PageBound::Latest;

    loop {
        let page = pager.fetch_page(bound, PAGE_LIMIT).await?;
        // Termination math uses the raw page length; own-message filtering
        // happens afterwards
        let Some(oldest) = page.iter().map(|m| m.id).min() else {
            break;
        };
        let page_len = page.len();

        collected.extend(page.into_iter().filter(|m| m.author_id != own_id));

        if page_len < PAGE_LIMIT as usize {
            break;
        }
        bound = PageBound::Before(oldest);
    }

    Ok(collected)
}

/// Incremental scan: page forward from the watermark until an empty or
/// short page signals exhaustion.
async fn collect_newer<P: MessagePager>(
    pager: &P,
    own_id: UserId,
    after: MessageId,
) -> Result<Vec<ScannedMessage>> {
    let mut collected = Vec::new();
    let mut bound = PageBound::After(after);

    loop {
        let page = pager.fetch_page(bound, PAGE_LIMIT).await?;
        let Some(newest) = page.iter().map(|m| m.id).max() else {
            break;
        };
        let page_len = page.len();

        collected.extend(page.into_iter().filter(|m| m.author_id != own_id));

        if page_len < PAGE_LIMIT as usize {
            break;
        }
        bound = PageBound::After(newest);
    }

    Ok(collected)
}

/// Process-wide single-flight gate for the sweep
#[derive(Default)]
pub struct RescanLock(Arc<AtomicBool>);

/// Holding this is proof that no other sweep is in flight.  Dropping it
/// releases the gate, including on error paths.
pub struct RescanGuard(Arc<AtomicBool>);

impl RescanLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<RescanGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RescanGuard(Arc::clone(&self.0)))
    }
}

impl Drop for RescanGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SweepSummary {
    pub messages: usize,
}

/// Sweep every text channel of the guild and fold the results into the
/// counter store.  Requires the caller to hold the rescan guard.
///
/// Channel-level atomicity: a channel's watermark advances only after its
/// batch has been folded and the store persisted, so a failure mid-sweep
/// leaves earlier channels consistent and later channels untouched for the
/// next attempt.
pub async fn run_guild_sweep(
    ctx: &Context<'_>,
    guild_id: GuildId,
    _guard: &RescanGuard,
) -> Result<SweepSummary> {
    let own_id = ctx.cache.current_user().id;
    let channels = guild_id.channels(ctx.http).await?;
    let mut messages = 0;

    for (channel_id, channel) in channels {
        if channel.kind != ChannelType::Text {
            continue;
        }

        let after = ctx.stats.read().await.watermark(channel_id);
        let pager = ChannelPager {
            channel_id,
            cache_http: ctx.cache_http,
        };
        let batch = fetch_since(&pager, own_id, after).await?;

        let Some(newest) = batch.iter().map(|m| m.id).max() else {
            continue;
        };

        log_internal!(
            "Swept {} new message(s) in \"{}\"",
            batch.len(),
            channel_id.color(ctx.http).await,
        );

        let mut stats = ctx.stats.write().await;
        aggregate::apply(&mut stats, ctx.emojis, &batch);
        stats.set_watermark(channel_id, newest);
        stats.persist().await;
        messages += batch.len();
    }

    Ok(SweepSummary { messages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const BOT_ID: u64 = 900;

    /// Vec-backed pager mimicking the platform's paging semantics: `before`
    /// serves the newest messages below the bound, `after` serves the oldest
    /// messages above it.
    struct FakePager {
        messages: Vec<ScannedMessage>,
        calls: AtomicUsize,
    }

    impl FakePager {
        fn new(messages: Vec<ScannedMessage>) -> Self {
            Self {
                messages,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[serenity::async_trait]
    impl MessagePager for FakePager {
        async fn fetch_page(&self, bound: PageBound, limit: u8) -> Result<Vec<ScannedMessage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let mut window: Vec<ScannedMessage> = self
                .messages
                .iter()
                .filter(|m| match bound {
                    PageBound::Latest => true,
                    PageBound::Before(id) => m.id < id,
                    PageBound::After(id) => m.id > id,
                })
                .cloned()
                .collect();

            match bound {
                PageBound::After(_) => {
                    // Oldest messages adjacent to the bound
                    window.sort_by_key(|m| m.id);
                    window.truncate(limit as usize);
                    // Served newest-first, like the platform
                    window.reverse();
                }
                _ => {
                    window.sort_by(|a, b| b.id.cmp(&a.id));
                    window.truncate(limit as usize);
                }
            }

            Ok(window)
        }
    }

    fn message(id: u64, author: u64) -> ScannedMessage {
        ScannedMessage {
            id: MessageId::new(id),
            author_id: UserId::new(author),
            author_name: format!("user-{author}"),
            content: String::new(),
        }
    }

    #[tokio::test]
    async fn full_scan_of_250_messages_takes_three_pages() {
        let pager = FakePager::new((1..=250).map(|id| message(id, 1)).collect());

        let collected = fetch_since(&pager, UserId::new(BOT_ID), None).await.unwrap();

        assert_eq!(pager.calls(), 3);
        assert_eq!(collected.len(), 250);

        // Every message exactly once
        let mut ids: Vec<u64> = collected.iter().map(|m| m.id.get()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 250);
    }

    #[tokio::test]
    async fn full_scan_excludes_own_messages_without_breaking_paging() {
        // 150 messages, every third one authored by the bot
        let pager = FakePager::new(
            (1..=150)
                .map(|id| message(id, if id % 3 == 0 { BOT_ID } else { 1 }))
                .collect(),
        );

        let collected = fetch_since(&pager, UserId::new(BOT_ID), None).await.unwrap();

        assert_eq!(pager.calls(), 2);
        assert_eq!(collected.len(), 100);
        assert!(collected.iter().all(|m| m.author_id != UserId::new(BOT_ID)));
    }

    #[tokio::test]
    async fn incremental_scan_from_newest_watermark_is_empty() {
        let pager = FakePager::new((1..=250).map(|id| message(id, 1)).collect());

        let collected = fetch_since(&pager, UserId::new(BOT_ID), Some(MessageId::new(250)))
            .await
            .unwrap();

        assert_eq!(pager.calls(), 1);
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn incremental_scan_collects_only_newer_messages() {
        let pager = FakePager::new((1..=250).map(|id| message(id, 1)).collect());

        let collected = fetch_since(&pager, UserId::new(BOT_ID), Some(MessageId::new(40)))
            .await
            .unwrap();

        assert_eq!(collected.len(), 210);
        assert!(collected.iter().all(|m| m.id.get() > 40));
        // 100 + 100 + 10
        assert_eq!(pager.calls(), 3);
    }

    #[tokio::test]
    async fn failed_page_aborts_the_fetch() {
        struct FailingPager;

        #[serenity::async_trait]
        impl MessagePager for FailingPager {
            async fn fetch_page(&self, _: PageBound, _: u8) -> Result<Vec<ScannedMessage>> {
                Err(anyhow::anyhow!("history unavailable"))
            }
        }

        assert!(fetch_since(&FailingPager, UserId::new(BOT_ID), None)
            .await
            .is_err());
    }

    #[test]
    fn rescan_lock_is_single_flight() {
        let lock = RescanLock::new();

        let guard = lock.try_acquire().expect("first acquire succeeds");
        assert!(
            lock.try_acquire().is_none(),
            "second trigger is rejected while a sweep is in flight"
        );

        drop(guard);
        assert!(
            lock.try_acquire().is_some(),
            "a new trigger succeeds after the sweep completes"
        );
    }
}
