use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub thread_id: Uuid,
    pub model: String,
    pub message: String,
    pub response: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A completed turn ready to be written; the response is known before the row exists.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub user_id: Uuid,
    pub thread_id: Uuid,
    pub model: String,
    pub message: String,
    pub response: String,
}

impl NewChatMessage {
    pub(crate) fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            thread_id: self.thread_id,
            model: self.model,
            message: self.message,
            response: Some(self.response),
            timestamp: Utc::now(),
        }
    }
}

/// Body of `POST /chat/`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<Uuid>,
}
