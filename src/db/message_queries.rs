use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ChatMessage, NewChatMessage};

pub async fn insert(pool: &PgPool, message: NewChatMessage) -> Result<ChatMessage, sqlx::Error> {
    let message = message.into_message();
    sqlx::query_as::<_, ChatMessage>(
        r#"
        INSERT INTO chat_messages (id, user_id, thread_id, model, message, response, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, thread_id, model, message, response, timestamp
        "#
    )
    .bind(message.id)
    .bind(message.user_id)
    .bind(message.thread_id)
    .bind(message.model)
    .bind(message.message)
    .bind(message.response)
    .bind(message.timestamp)
    .fetch_one(pool)
    .await
}

/// Chronological; `seq` breaks timestamp ties in insertion order
pub async fn fetch_for_thread(
    pool: &PgPool,
    thread_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, user_id, thread_id, model, message, response, timestamp
        FROM chat_messages
        WHERE thread_id = $1
        ORDER BY timestamp ASC, seq ASC
        LIMIT $2
        "#
    )
    .bind(thread_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Newest first
pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, user_id, thread_id, model, message, response, timestamp
        FROM chat_messages
        WHERE user_id = $1
        ORDER BY timestamp DESC, seq DESC
        "#
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_for_thread(pool: &PgPool, thread_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chat_messages WHERE thread_id = $1")
        .bind(thread_id)
        .fetch_one(pool)
        .await
}
