use async_trait::async_trait;

use crate::errors::LlmError;

/// A single-turn text generation backend. Implementations do not retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name used in degraded-reply markers
    fn name(&self) -> &'static str;

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

pub(crate) fn map_reqwest_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Network(e.to_string())
    }
}

/// Turns a non-2xx response into the matching `LlmError`.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited);
    }

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
    }

    Ok(response)
}
