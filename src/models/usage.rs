use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Daily token counter, one per user. `tokens_used` counts usage since `last_reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UsageCounter {
    pub user_id: Uuid,
    pub tokens_used: i64,
    pub last_reset: NaiveDate,
}
