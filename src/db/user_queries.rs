use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub async fn insert(pool: &PgPool, user: NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash, preferred_model)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, password_hash, preferred_model, created_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user.username)
    .bind(user.password_hash)
    .bind(user.preferred_model.as_str())
    .fetch_one(pool)
    .await
}

pub async fn fetch_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, preferred_model, created_at
        FROM users
        WHERE username = $1
        "#
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, preferred_model, created_at
        FROM users
        WHERE id = $1
        "#
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}
