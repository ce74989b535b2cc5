//! Persistence seams. Services depend on these traits; `PgStore` backs the running
//! server and `MemoryStore` backs tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatThread, NewChatMessage, NewUser, UsageCounter, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, sqlx::Error>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_thread(&self, user_id: Uuid) -> Result<ChatThread, sqlx::Error>;

    /// Ownership is part of the lookup: another user's thread reads as missing.
    async fn find_thread_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<ChatThread>, sqlx::Error>;

    async fn find_thread(&self, id: Uuid) -> Result<Option<ChatThread>, sqlx::Error>;

    /// Newest first
    async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ChatThread>, sqlx::Error>;

    async fn set_thread_title(&self, id: Uuid, title: &str) -> Result<u64, sqlx::Error>;

    /// Removes the thread and its messages; returns rows deleted (0 when not owned or absent).
    async fn delete_thread(&self, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn insert_message(&self, message: NewChatMessage) -> Result<ChatMessage, sqlx::Error>;

    /// Chronological, optionally truncated to the first `limit` messages
    async fn thread_messages(&self, thread_id: Uuid, limit: Option<i64>) -> Result<Vec<ChatMessage>, sqlx::Error>;

    /// Newest first
    async fn user_messages(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, sqlx::Error>;

    async fn count_thread_messages(&self, thread_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn reset_usage_if_stale(&self, user_id: Uuid, today: NaiveDate) -> Result<UsageCounter, sqlx::Error>;

    async fn add_usage(&self, user_id: Uuid, tokens: i64, today: NaiveDate) -> Result<UsageCounter, sqlx::Error>;

    async fn usage(&self, user_id: Uuid) -> Result<Option<UsageCounter>, sqlx::Error>;
}
