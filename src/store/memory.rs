use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatThread, NewChatMessage, NewUser, UsageCounter, User};
use crate::store::{ChatStore, UserStore};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    threads: Vec<ChatThread>,
    messages: Vec<ChatMessage>,
    usage: HashMap<Uuid, UsageCounter>,
}

/// Process-local store with the same observable semantics as `PgStore`.
/// Vectors keep insertion order, which stands in for the `seq` column.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a user's counter, e.g. to start from a stale day.
    pub fn set_usage(&self, counter: UsageCounter) {
        self.inner.lock().usage.insert(counter.user_id, counter);
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().messages.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let mut inner = self.inner.lock();
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate key value violates unique constraint: username {}",
                user.username
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            preferred_model: user.preferred_model.as_str().to_string(),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.inner.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.inner.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        Ok(self.inner.lock().users.iter().any(|u| u.username == username))
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_thread(&self, user_id: Uuid) -> Result<ChatThread, sqlx::Error> {
        let thread = ChatThread::new(user_id);
        self.inner.lock().threads.push(thread.clone());
        Ok(thread)
    }

    async fn find_thread_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<ChatThread>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .threads
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn find_thread(&self, id: Uuid) -> Result<Option<ChatThread>, sqlx::Error> {
        Ok(self.inner.lock().threads.iter().find(|t| t.id == id).cloned())
    }

    async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ChatThread>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .threads
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_thread_title(&self, id: Uuid, title: &str) -> Result<u64, sqlx::Error> {
        let mut inner = self.inner.lock();
        match inner.threads.iter_mut().find(|t| t.id == id) {
            Some(thread) => {
                thread.title = title.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_thread(&self, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let mut inner = self.inner.lock();
        let before = inner.threads.len();
        inner.threads.retain(|t| !(t.id == id && t.user_id == user_id));
        let removed = (before - inner.threads.len()) as u64;
        if removed > 0 {
            inner.messages.retain(|m| m.thread_id != id);
        }
        Ok(removed)
    }

    async fn insert_message(&self, message: NewChatMessage) -> Result<ChatMessage, sqlx::Error> {
        let mut inner = self.inner.lock();
        if !inner.threads.iter().any(|t| t.id == message.thread_id) {
            return Err(sqlx::Error::RowNotFound);
        }
        let message = message.into_message();
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn thread_messages(&self, thread_id: Uuid, limit: Option<i64>) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let limit = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(self
            .inner
            .lock()
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn user_messages(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .messages
            .iter()
            .rev()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_thread_messages(&self, thread_id: Uuid) -> Result<i64, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .count() as i64)
    }

    async fn reset_usage_if_stale(&self, user_id: Uuid, today: NaiveDate) -> Result<UsageCounter, sqlx::Error> {
        let mut inner = self.inner.lock();
        let counter = inner.usage.entry(user_id).or_insert(UsageCounter {
            user_id,
            tokens_used: 0,
            last_reset: today,
        });
        if counter.last_reset != today {
            counter.tokens_used = 0;
            counter.last_reset = today;
        }
        Ok(counter.clone())
    }

    async fn add_usage(&self, user_id: Uuid, tokens: i64, today: NaiveDate) -> Result<UsageCounter, sqlx::Error> {
        let mut inner = self.inner.lock();
        let counter = inner.usage.entry(user_id).or_insert(UsageCounter {
            user_id,
            tokens_used: 0,
            last_reset: today,
        });
        counter.tokens_used += tokens;
        Ok(counter.clone())
    }

    async fn usage(&self, user_id: Uuid) -> Result<Option<UsageCounter>, sqlx::Error> {
        Ok(self.inner.lock().usage.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PreferredModel;

    fn new_message(user_id: Uuid, thread_id: Uuid, text: &str) -> NewChatMessage {
        NewChatMessage {
            user_id,
            thread_id,
            model: "gemini-2.0-flash".to_string(),
            message: text.to_string(),
            response: format!("re: {}", text),
        }
    }

    #[tokio::test]
    async fn test_delete_thread_cascades_messages() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let thread = store.create_thread(user).await.unwrap();
        store.insert_message(new_message(user, thread.id, "one")).await.unwrap();
        store.insert_message(new_message(user, thread.id, "two")).await.unwrap();

        assert_eq!(store.delete_thread(thread.id, user).await.unwrap(), 1);
        assert_eq!(store.message_count(), 0);
        assert!(store.find_thread(thread.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_thread_requires_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let thread = store.create_thread(owner).await.unwrap();

        assert_eq!(store.delete_thread(thread.id, Uuid::new_v4()).await.unwrap(), 0);
        assert!(store.find_thread(thread.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_thread_messages_are_chronological_and_limited() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let thread = store.create_thread(user).await.unwrap();
        for text in ["a", "b", "c"] {
            store.insert_message(new_message(user, thread.id, text)).await.unwrap();
        }

        let all = store.thread_messages(thread.id, None).await.unwrap();
        let texts: Vec<_> = all.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);

        let first_two = store.thread_messages(thread.id, Some(2)).await.unwrap();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1].message, "b");

        let newest_first = store.user_messages(user).await.unwrap();
        assert_eq!(newest_first[0].message, "c");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        let user = NewUser {
            username: "ana".to_string(),
            password_hash: "hash".to_string(),
            preferred_model: PreferredModel::default(),
        };
        store.insert_user(user.clone()).await.unwrap();
        assert!(store.insert_user(user).await.is_err());
    }
}
