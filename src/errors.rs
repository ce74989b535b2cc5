use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Failures raised while routing a prompt to a model provider.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("LLM usage is currently disabled by admin.")]
    Disabled,
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limited by provider")]
    RateLimited,
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Daily quota exceeded.")]
    QuotaExceeded,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

fn error_body(status: StatusCode, msg: impl Into<String>) -> axum::response::Response {
    (status, Json(json!({ "error": msg.into() }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => error_body(StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::QuotaExceeded => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("86400"));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    Json(json!({ "error": "Daily quota exceeded." })),
                )
                    .into_response()
            }
            AppError::Llm(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(msg) => error_body(StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Db(_) => error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}
