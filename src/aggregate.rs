//! Folds fetched message batches into the counter store.

use crate::reactions::EmojiPool;
use crate::stats::StatStore;
use crate::sweep::ScannedMessage;

/// Count every pool-emoji occurrence in the batch against its author.
///
/// This is a commutative fold: batch order never affects the final counts.
/// It is deliberately not idempotent; applying the same batch twice
/// double-counts.  Deduplication is the watermark's job, not this fold's.
pub fn apply(stats: &mut StatStore, emojis: &EmojiPool, batch: &[ScannedMessage]) {
    for msg in batch {
        for (index, emoji) in emojis.iter_indexed() {
            let occurrences = msg.content.matches(emoji).count() as u64;
            if occurrences > 0 {
                stats.increment_user(msg.author_id, &msg.author_name, index, occurrences);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::{MessageId, UserId};
    use std::path::PathBuf;

    fn pool() -> EmojiPool {
        EmojiPool(vec![
            "<:scowl1:1>".into(),
            "<:scowl2:2>".into(),
            "<:scowl3:3>".into(),
        ])
    }

    fn message(id: u64, author: u64, content: &str) -> ScannedMessage {
        ScannedMessage {
            id: MessageId::new(id),
            author_id: UserId::new(author),
            author_name: format!("user-{author}"),
            content: content.to_owned(),
        }
    }

    fn store() -> StatStore {
        StatStore::empty(PathBuf::from("unused.json"))
    }

    #[test]
    fn occurrences_count_per_author_and_emoji() {
        let mut stats = store();
        let batch = vec![
            message(1, 10, "<:scowl1:1> hello <:scowl1:1>"),
            message(2, 10, "<:scowl3:3>"),
            message(3, 11, "no emojis here"),
            message(4, 12, "<:scowl2:2>"),
        ];

        apply(&mut stats, &pool(), &batch);

        let alice = stats.read_user(UserId::new(10)).unwrap();
        assert_eq!(alice.emojis.get(&1), Some(&2));
        assert_eq!(alice.emojis.get(&3), Some(&1));
        assert_eq!(alice.total(), 3);

        assert!(stats.read_user(UserId::new(11)).is_none());
        assert_eq!(stats.read_user(UserId::new(12)).unwrap().total(), 1);
    }

    #[test]
    fn batch_order_does_not_change_the_result() {
        let batch = vec![
            message(1, 10, "<:scowl1:1>"),
            message(2, 11, "<:scowl1:1> <:scowl2:2>"),
            message(3, 10, "<:scowl2:2>"),
        ];
        let mut reversed = batch.clone();
        reversed.reverse();

        let mut forward = store();
        apply(&mut forward, &pool(), &batch);
        let mut backward = store();
        apply(&mut backward, &pool(), &reversed);

        for user in [10, 11] {
            assert_eq!(
                forward.read_user(UserId::new(user)).map(|r| r.emojis.clone()),
                backward.read_user(UserId::new(user)).map(|r| r.emojis.clone()),
            );
        }
    }

    #[test]
    fn reapplying_a_batch_double_counts() {
        // Documented behavior: the fold is not idempotent.  Only the
        // watermark prevents a message from being delivered twice.
        let mut stats = store();
        let batch = vec![message(1, 10, "<:scowl1:1>")];

        apply(&mut stats, &pool(), &batch);
        apply(&mut stats, &pool(), &batch);

        assert_eq!(stats.read_user(UserId::new(10)).unwrap().total(), 2);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut stats = store();
        apply(&mut stats, &pool(), &[]);
        assert_eq!(stats.users().count(), 0);
    }
}
