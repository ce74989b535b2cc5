use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::ChatStore;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a settable date
pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(Mutex::new(date))
    }

    pub fn set(&self, date: NaiveDate) {
        *self.0.lock() = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock()
    }
}

/// Approximate token count for a turn: whitespace-separated words on both sides.
pub fn estimate_tokens(prompt: &str, response: &str) -> i64 {
    (prompt.split_whitespace().count() + response.split_whitespace().count()) as i64
}

/// Per-user daily token budget.
///
/// Only [`QuotaTracker::check_quota`] rolls the counter over to a new day;
/// [`QuotaTracker::increment_usage`] adds to whatever day the counter is on.
#[derive(Clone)]
pub struct QuotaTracker {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
    daily_limit: i64,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>, daily_limit: i64) -> Self {
        Self {
            store,
            clock,
            daily_limit,
        }
    }

    /// True while usage since the last reset is at or under the limit.
    /// The reset is persisted whatever the outcome.
    pub async fn check_quota(&self, user_id: Uuid) -> Result<bool, AppError> {
        let counter = self
            .store
            .reset_usage_if_stale(user_id, self.clock.today())
            .await?;

        let allowed = counter.tokens_used <= self.daily_limit;
        if !allowed {
            warn!(
                "Daily quota exceeded for user {}: {}/{}",
                user_id, counter.tokens_used, self.daily_limit
            );
        }
        Ok(allowed)
    }

    pub async fn increment_usage(&self, user_id: Uuid, tokens: i64) -> Result<(), AppError> {
        let counter = self
            .store
            .add_usage(user_id, tokens.max(0), self.clock.today())
            .await?;

        info!(
            "Token usage for user {}: {}/{} (+{})",
            user_id, counter.tokens_used, self.daily_limit, tokens
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UsageCounter;
    use crate::store::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn tracker(store: &MemoryStore, clock: Arc<FixedClock>) -> QuotaTracker {
        QuotaTracker::new(Arc::new(store.clone()), clock, 10_000)
    }

    #[test]
    fn test_estimate_tokens_counts_words() {
        assert_eq!(estimate_tokens("what is  rust", "a language\nfor systems"), 7);
        assert_eq!(estimate_tokens("", "   "), 0);
    }

    #[tokio::test]
    async fn test_counter_created_lazily() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let quota = tracker(&store, Arc::new(FixedClock::new(day(1))));

        assert!(store.usage(user).await.unwrap().is_none());
        assert!(quota.check_quota(user).await.unwrap());
        assert_eq!(
            store.usage(user).await.unwrap(),
            Some(UsageCounter { user_id: user, tokens_used: 0, last_reset: day(1) })
        );
    }

    #[tokio::test]
    async fn test_limit_is_inclusive() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let quota = tracker(&store, Arc::new(FixedClock::new(day(1))));

        quota.increment_usage(user, 10_000).await.unwrap();
        assert!(quota.check_quota(user).await.unwrap());

        quota.increment_usage(user, 1).await.unwrap();
        assert!(!quota.check_quota(user).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejection_lifts_when_day_changes() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let clock = Arc::new(FixedClock::new(day(1)));
        let quota = tracker(&store, clock.clone());

        quota.increment_usage(user, 12_000).await.unwrap();
        assert!(!quota.check_quota(user).await.unwrap());

        clock.set(day(2));
        assert!(quota.check_quota(user).await.unwrap());
        let counter = store.usage(user).await.unwrap().unwrap();
        assert_eq!(counter.tokens_used, 0);
        assert_eq!(counter.last_reset, day(2));
    }

    #[tokio::test]
    async fn test_increment_does_not_reset_stale_day() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.set_usage(UsageCounter { user_id: user, tokens_used: 9_000, last_reset: day(1) });
        let quota = tracker(&store, Arc::new(FixedClock::new(day(5))));

        quota.increment_usage(user, 500).await.unwrap();

        let counter = store.usage(user).await.unwrap().unwrap();
        assert_eq!(counter.tokens_used, 9_500);
        assert_eq!(counter.last_reset, day(1));

        // The next check rolls it over.
        assert!(quota.check_quota(user).await.unwrap());
        assert_eq!(store.usage(user).await.unwrap().unwrap().tokens_used, 0);
    }

    #[tokio::test]
    async fn test_stale_reset_persisted_even_when_over_limit() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.set_usage(UsageCounter { user_id: user, tokens_used: 50_000, last_reset: day(1) });
        let quota = tracker(&store, Arc::new(FixedClock::new(day(2))));

        assert!(quota.check_quota(user).await.unwrap());
        assert_eq!(store.usage(user).await.unwrap().unwrap().last_reset, day(2));
    }
}
