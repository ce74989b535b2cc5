use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ChatMessage, ChatRequest, ChatThread, NewChatMessage, ThreadTitle};
use crate::services::llm_service::{self, ModelRouter, RouterReply};
use crate::services::quota_service::{estimate_tokens, QuotaTracker};
use crate::services::title_service::TitleGenerator;
use crate::store::ChatStore;

const MAX_MODEL_LEN: usize = 100;

/// The user a request acts for, as resolved by the auth layer
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
}

/// Answers chat turns and owns the thread/message operations behind the HTTP routes.
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    router: Arc<ModelRouter>,
    quota: QuotaTracker,
    titles: TitleGenerator,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        router: Arc<ModelRouter>,
        quota: QuotaTracker,
        titles: TitleGenerator,
    ) -> Self {
        Self {
            store,
            router,
            quota,
            titles,
        }
    }

    /// One chat turn: thread, quota, provider, usage, persist, then a title for a fresh thread.
    pub async fn send_message(&self, caller: &Caller, request: ChatRequest) -> Result<ChatMessage, AppError> {
        validate_request(&request)?;

        let thread = self.resolve_thread(caller.id, request.thread_id).await?;
        let had_title = thread.has_title();

        if !self.quota.check_quota(caller.id).await? {
            return Err(AppError::QuotaExceeded);
        }

        let model = self.router.effective_model(&request.model).to_string();
        let reply = self.router.resolve(&model, &request.message).await?;
        llm_service::log_call(&caller.username, &model, &request.message);

        // A degraded reply is stored for the user to see but only the prompt is billed.
        let tokens = match &reply {
            RouterReply::Text(text) => estimate_tokens(&request.message, text),
            RouterReply::Degraded { .. } => estimate_tokens(&request.message, ""),
        };
        self.quota.increment_usage(caller.id, tokens).await?;

        let message = self
            .store
            .insert_message(NewChatMessage {
                user_id: caller.id,
                thread_id: thread.id,
                model,
                message: request.message,
                response: reply.into_text(),
            })
            .await
            .map_err(|e| {
                error!("Failed to persist message for thread {}: {}", thread.id, e);
                AppError::Db(e)
            })?;

        if !had_title && self.store.count_thread_messages(thread.id).await? == 1 {
            self.titles.generate_title(thread.id).await;
        }

        Ok(message)
    }

    /// A supplied id that is missing or owned by someone else falls back to a fresh thread.
    async fn resolve_thread(&self, user_id: Uuid, thread_id: Option<Uuid>) -> Result<ChatThread, AppError> {
        if let Some(id) = thread_id {
            if let Some(thread) = self.store.find_thread_for_user(id, user_id).await? {
                return Ok(thread);
            }
            info!("Thread {} not found for user {}, starting a new one", id, user_id);
        }
        Ok(self.store.create_thread(user_id).await?)
    }

    pub async fn list_messages(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        Ok(self.store.user_messages(user_id).await?)
    }

    pub async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ChatThread>, AppError> {
        Ok(self.store.list_threads(user_id).await?)
    }

    pub async fn create_thread(&self, user_id: Uuid) -> Result<ChatThread, AppError> {
        Ok(self.store.create_thread(user_id).await?)
    }

    async fn owned_thread(&self, thread_id: Uuid, user_id: Uuid) -> Result<ChatThread, AppError> {
        self.store
            .find_thread_for_user(thread_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))
    }

    pub async fn thread_messages(&self, thread_id: Uuid, user_id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        let thread = self.owned_thread(thread_id, user_id).await?;
        Ok(self.store.thread_messages(thread.id, None).await?)
    }

    pub async fn delete_thread(&self, thread_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        match self.store.delete_thread(thread_id, user_id).await? {
            0 => Err(AppError::NotFound("Thread not found".to_string())),
            _ => Ok(()),
        }
    }

    pub async fn thread_title(&self, thread_id: Uuid, user_id: Uuid) -> Result<ThreadTitle, AppError> {
        Ok(self.owned_thread(thread_id, user_id).await?.into())
    }
}

fn validate_request(request: &ChatRequest) -> Result<(), AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message: This field may not be blank.".into()));
    }
    if request.model.chars().count() > MAX_MODEL_LEN {
        return Err(AppError::Validation(format!(
            "model: Ensure this field has no more than {} characters.",
            MAX_MODEL_LEN
        )));
    }
    Ok(())
}
