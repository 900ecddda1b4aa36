//! Miscellaneous convenience methods

use crate::context::Context;

#[serenity::async_trait]
pub trait MessageHelper {
    async fn is_from_admin(&self, ctx: &Context<'_>) -> bool;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    async fn is_from_admin(&self, ctx: &Context<'_>) -> bool {
        ctx.cfg.read().await.is_admin(self.author.id)
    }
}

/// Format a count with `.` thousands separators, e.g. `1234567` -> `1.234.567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1.000");
        assert_eq!(group_thousands(1234567), "1.234.567");
    }
}
