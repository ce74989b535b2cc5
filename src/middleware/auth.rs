//! Bearer-token authentication for axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::services::chat_service::Caller;
use crate::state::AppState;

/// Extractor that resolves `Authorization: Bearer <access token>` to the calling user.
/// Rejects with 401 when the header is absent, malformed or the token is not a live access token.
pub struct AuthUser(pub Caller);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let caller = state.auth.authenticate(token).await?;
        Ok(AuthUser(caller))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
