use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::auth_service::AuthService;
use crate::services::chat_service::ChatService;
use crate::services::llm_service::ModelRouter;
use crate::services::quota_service::{Clock, QuotaTracker};
use crate::services::title_service::TitleGenerator;
use crate::store::{ChatStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub auth: Arc<AuthService>,
}

/// Everything the services are wired from
pub struct AppParts {
    pub chat_store: Arc<dyn ChatStore>,
    pub user_store: Arc<dyn UserStore>,
    pub router: Arc<ModelRouter>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthConfig,
    pub daily_token_limit: i64,
    pub title_model: String,
}

impl AppState {
    pub fn new(parts: AppParts) -> Self {
        let quota = QuotaTracker::new(parts.chat_store.clone(), parts.clock, parts.daily_token_limit);
        let titles = TitleGenerator::new(parts.chat_store.clone(), parts.router.clone(), parts.title_model);
        let chat = ChatService::new(parts.chat_store, parts.router, quota, titles);

        Self {
            chat: Arc::new(chat),
            auth: Arc::new(AuthService::new(parts.user_store, parts.auth)),
        }
    }
}
