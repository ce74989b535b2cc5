use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{message_queries, thread_queries, usage_queries, user_queries};
use crate::models::{ChatMessage, ChatThread, NewChatMessage, NewUser, UsageCounter, User};
use crate::store::{ChatStore, UserStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        user_queries::insert(&self.pool, user).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        user_queries::fetch_by_username(&self.pool, username).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        user_queries::fetch_by_id(&self.pool, id).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        user_queries::username_exists(&self.pool, username).await
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create_thread(&self, user_id: Uuid) -> Result<ChatThread, sqlx::Error> {
        thread_queries::insert(&self.pool, ChatThread::new(user_id)).await
    }

    async fn find_thread_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<ChatThread>, sqlx::Error> {
        thread_queries::fetch_for_user(&self.pool, id, user_id).await
    }

    async fn find_thread(&self, id: Uuid) -> Result<Option<ChatThread>, sqlx::Error> {
        thread_queries::fetch_one(&self.pool, id).await
    }

    async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ChatThread>, sqlx::Error> {
        thread_queries::fetch_all_for_user(&self.pool, user_id).await
    }

    async fn set_thread_title(&self, id: Uuid, title: &str) -> Result<u64, sqlx::Error> {
        thread_queries::update_title(&self.pool, id, title).await
    }

    async fn delete_thread(&self, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        thread_queries::delete_for_user(&self.pool, id, user_id).await
    }

    async fn insert_message(&self, message: NewChatMessage) -> Result<ChatMessage, sqlx::Error> {
        message_queries::insert(&self.pool, message).await
    }

    async fn thread_messages(&self, thread_id: Uuid, limit: Option<i64>) -> Result<Vec<ChatMessage>, sqlx::Error> {
        message_queries::fetch_for_thread(&self.pool, thread_id, limit).await
    }

    async fn user_messages(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, sqlx::Error> {
        message_queries::fetch_for_user(&self.pool, user_id).await
    }

    async fn count_thread_messages(&self, thread_id: Uuid) -> Result<i64, sqlx::Error> {
        message_queries::count_for_thread(&self.pool, thread_id).await
    }

    async fn reset_usage_if_stale(&self, user_id: Uuid, today: NaiveDate) -> Result<UsageCounter, sqlx::Error> {
        usage_queries::reset_if_stale(&self.pool, user_id, today).await
    }

    async fn add_usage(&self, user_id: Uuid, tokens: i64, today: NaiveDate) -> Result<UsageCounter, sqlx::Error> {
        usage_queries::add_tokens(&self.pool, user_id, tokens, today).await
    }

    async fn usage(&self, user_id: Uuid) -> Result<Option<UsageCounter>, sqlx::Error> {
        usage_queries::fetch(&self.pool, user_id).await
    }
}
