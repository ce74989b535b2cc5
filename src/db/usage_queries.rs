use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UsageCounter;

/// Creates the counter if missing and zeroes it when `last_reset` is not `today`.
/// A single upsert, so concurrent checks cannot observe a half-applied reset.
pub async fn reset_if_stale(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<UsageCounter, sqlx::Error> {
    sqlx::query_as::<_, UsageCounter>(
        r#"
        INSERT INTO usage_counters (user_id, tokens_used, last_reset)
        VALUES ($1, 0, $2)
        ON CONFLICT (user_id)
        DO UPDATE SET
            tokens_used = CASE
                WHEN usage_counters.last_reset <> EXCLUDED.last_reset THEN 0
                ELSE usage_counters.tokens_used
            END,
            last_reset = EXCLUDED.last_reset
        RETURNING user_id, tokens_used, last_reset
        "#
    )
    .bind(user_id)
    .bind(today)
    .fetch_one(pool)
    .await
}

/// Adds `tokens` in place. An existing counter keeps its `last_reset`; a new one starts at `today`.
pub async fn add_tokens(
    pool: &PgPool,
    user_id: Uuid,
    tokens: i64,
    today: NaiveDate,
) -> Result<UsageCounter, sqlx::Error> {
    sqlx::query_as::<_, UsageCounter>(
        r#"
        INSERT INTO usage_counters (user_id, tokens_used, last_reset)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET tokens_used = usage_counters.tokens_used + EXCLUDED.tokens_used
        RETURNING user_id, tokens_used, last_reset
        "#
    )
    .bind(user_id)
    .bind(tokens)
    .bind(today)
    .fetch_one(pool)
    .await
}

pub async fn fetch(pool: &PgPool, user_id: Uuid) -> Result<Option<UsageCounter>, sqlx::Error> {
    sqlx::query_as::<_, UsageCounter>(
        "SELECT user_id, tokens_used, last_reset FROM usage_counters WHERE user_id = $1"
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
