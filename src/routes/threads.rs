use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{ChatMessage, ChatThread, ThreadTitle};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/threads/", get(list_threads).post(create_thread))
        .route("/threads/:id/", delete(delete_thread))
        .route("/threads/:id/messages/", get(thread_messages))
        .route("/threads/:id/title/", get(thread_title))
}

/// GET /api/threads/
pub async fn list_threads(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<ChatThread>>, AppError> {
    info!("GET /api/threads/ - user: {}", caller.username);
    let threads = state.chat.list_threads(caller.id).await?;
    Ok(Json(threads))
}

/// POST /api/threads/
pub async fn create_thread(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<(StatusCode, Json<ChatThread>), AppError> {
    info!("POST /api/threads/ - user: {}", caller.username);
    let thread = state.chat.create_thread(caller.id).await.map_err(|e| {
        error!("Failed to create thread for {}: {}", caller.username, e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(thread)))
}

/// GET /api/threads/:id/messages/
pub async fn thread_messages(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    info!("GET /api/threads/{}/messages/ - user: {}", id, caller.username);
    let messages = state.chat.thread_messages(id, caller.id).await?;
    Ok(Json(messages))
}

/// DELETE /api/threads/:id/
pub async fn delete_thread(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /api/threads/{}/ - user: {}", id, caller.username);
    match state.chat.delete_thread(id, caller.id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete thread {}: {}", id, e);
            Err(e)
        }
    }
}

/// GET /api/threads/:id/title/
pub async fn thread_title(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreadTitle>, AppError> {
    info!("GET /api/threads/{}/title/ - user: {}", id, caller.username);
    let title = state.chat.thread_title(id, caller.id).await?;
    Ok(Json(title))
}
