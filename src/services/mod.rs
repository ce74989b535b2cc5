pub mod auth_service;
pub mod chat_service;
pub mod llm_service;
pub mod quota_service;
pub mod title_service;
