use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ChatThread;

pub async fn insert(pool: &PgPool, thread: ChatThread) -> Result<ChatThread, sqlx::Error> {
    sqlx::query_as::<_, ChatThread>(
        r#"
        INSERT INTO chat_threads (id, user_id, title, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, title, created_at
        "#
    )
    .bind(thread.id)
    .bind(thread.user_id)
    .bind(thread.title)
    .bind(thread.created_at)
    .fetch_one(pool)
    .await
}

/// Only returns the thread when it belongs to `user_id`
pub async fn fetch_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<ChatThread>, sqlx::Error> {
    sqlx::query_as::<_, ChatThread>(
        r#"
        SELECT id, user_id, title, created_at
        FROM chat_threads
        WHERE id = $1 AND user_id = $2
        "#
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<ChatThread>, sqlx::Error> {
    sqlx::query_as::<_, ChatThread>(
        "SELECT id, user_id, title, created_at FROM chat_threads WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ChatThread>, sqlx::Error> {
    sqlx::query_as::<_, ChatThread>(
        r#"
        SELECT id, user_id, title, created_at
        FROM chat_threads
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update_title(pool: &PgPool, id: Uuid, title: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE chat_threads SET title = $1 WHERE id = $2")
        .bind(title)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Messages go with the thread through `ON DELETE CASCADE`
pub async fn delete_for_user(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chat_threads WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
