use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use http::StatusCode;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{AccessToken, RefreshRequest, SignupRequest, TokenPair, TokenRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", post(signup))
        .route("/token/", post(obtain_token))
        .route("/token/refresh/", post(refresh_token))
        .route("/login/", post(login))
}

/// POST /api/signup/
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /api/signup/ - username: {:?}", data.username);

    state.auth.signup(data).await.map_err(|e| {
        error!("Signup failed: {}", e);
        e
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "User created successfully." }))))
}

/// POST /api/token/
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /api/token/ - username: {}", data.username);
    let pair = state.auth.obtain_tokens(&data.username, &data.password).await?;
    Ok(Json(pair))
}

/// POST /api/token/refresh/
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /api/token/refresh/");
    let access = state.auth.refresh(&data.refresh)?;
    Ok(Json(access))
}

/// POST /api/login/
pub async fn login(AuthUser(caller): AuthUser) -> Json<Value> {
    info!("POST /api/login/ - user: {}", caller.username);
    Json(json!({ "message": "User logged in." }))
}
