use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{ChatMessage, ChatRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat/", get(list_messages).post(send_message))
}

/// POST /api/chat/
#[axum::debug_handler(state = AppState)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatMessage>, AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /api/chat/ - user: {}, model: {:?}", caller.username, data.model);

    let message = state.chat.send_message(&caller, data).await.map_err(|e| {
        error!("Chat turn failed for {}: {}", caller.username, e);
        e
    })?;

    Ok(Json(message))
}

/// GET /api/chat/
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    info!("GET /api/chat/ - user: {}", caller.username);

    let messages = state.chat.list_messages(caller.id).await.map_err(|e| {
        error!("Failed to list messages for {}: {}", caller.username, e);
        e
    })?;

    Ok(Json(messages))
}
