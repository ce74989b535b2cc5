use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A conversation owned by one user. `title` stays empty until the first exchange is summarized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatThread {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl ChatThread {
    pub(crate) fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadTitle {
    pub id: Uuid,
    pub title: String,
}

impl From<ChatThread> for ThreadTitle {
    fn from(thread: ChatThread) -> Self {
        Self {
            id: thread.id,
            title: thread.title,
        }
    }
}
