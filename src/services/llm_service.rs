use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use crate::config::{self, LlmConfig};
use crate::errors::LlmError;
use crate::external::gemini::GeminiProvider;
use crate::external::llm_provider::LlmProvider;
use crate::external::openai::OpenAiProvider;

/// Global on/off switch for all LLM traffic, consulted on every call
pub trait LlmSwitch: Send + Sync {
    fn is_enabled(&self) -> bool;
}

/// Re-reads `LLM_ENABLED` each time so an operator can flip it without a restart.
pub struct EnvSwitch;

impl LlmSwitch for EnvSwitch {
    fn is_enabled(&self) -> bool {
        config::llm_enabled_from_env()
    }
}

pub struct StaticSwitch(AtomicBool);

impl StaticSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl LlmSwitch for StaticSwitch {
    fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    /// Provider is chosen by model-id prefix: `gemini*` or `gpt*`.
    pub fn for_model(model: &str) -> Result<Self, LlmError> {
        if model.starts_with("gemini") {
            Ok(ProviderKind::Gemini)
        } else if model.starts_with("gpt") {
            Ok(ProviderKind::OpenAi)
        } else {
            Err(LlmError::UnsupportedModel(model.to_string()))
        }
    }
}

/// Outcome of a routed call. Provider failures are not errors here; they come back
/// as `Degraded` so the caller decides what to do with them.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterReply {
    Text(String),
    Degraded { provider: &'static str, detail: String },
}

impl RouterReply {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RouterReply::Degraded { .. })
    }

    /// Text to show the user; degraded replies render as a bracketed marker.
    pub fn into_text(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RouterReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterReply::Text(text) => f.write_str(text),
            RouterReply::Degraded { provider, detail } => write!(f, "[{} error: {}]", provider, detail),
        }
    }
}

/// Maps a model id to its provider client and makes one single-turn call.
pub struct ModelRouter {
    default_model: String,
    gemini: Arc<dyn LlmProvider>,
    openai: Arc<dyn LlmProvider>,
    switch: Arc<dyn LlmSwitch>,
}

impl ModelRouter {
    pub fn new(
        default_model: impl Into<String>,
        gemini: Arc<dyn LlmProvider>,
        openai: Arc<dyn LlmProvider>,
        switch: Arc<dyn LlmSwitch>,
    ) -> Self {
        Self {
            default_model: default_model.into(),
            gemini,
            openai,
            switch,
        }
    }

    /// Builds both HTTP providers over one shared client.
    pub fn from_config(config: &LlmConfig, switch: Arc<dyn LlmSwitch>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        if config.google_api_key.is_none() {
            warn!("GOOGLE_API_KEY not configured. Gemini models will return degraded replies.");
        }
        if config.openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not configured. GPT models will return degraded replies.");
        }

        let gemini = GeminiProvider::new(client.clone(), config.google_api_key.clone());
        let openai = OpenAiProvider::new(client, config.openai_api_key.clone(), config.temperature);

        Ok(Self::new(
            config.default_model.clone(),
            Arc::new(gemini),
            Arc::new(openai),
            switch,
        ))
    }

    /// Empty ids fall back to the configured default
    pub fn effective_model<'a>(&'a self, model: &'a str) -> &'a str {
        if model.is_empty() {
            &self.default_model
        } else {
            model
        }
    }

    pub async fn resolve(&self, model: &str, prompt: &str) -> Result<RouterReply, LlmError> {
        if !self.switch.is_enabled() {
            return Err(LlmError::Disabled);
        }

        let model = self.effective_model(model);
        let provider = match ProviderKind::for_model(model)? {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
        };

        match provider.generate(model, prompt).await {
            Ok(text) => Ok(RouterReply::Text(text)),
            Err(e) => {
                warn!("{} call for model {} failed: {}", provider.name(), model, e);
                Ok(RouterReply::Degraded {
                    provider: provider.name(),
                    detail: e.to_string(),
                })
            }
        }
    }
}

impl fmt::Debug for ModelRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRouter")
            .field("default_model", &self.default_model)
            .field("enabled", &self.switch.is_enabled())
            .finish()
    }
}

pub(crate) fn log_call(username: &str, model: &str, prompt: &str) {
    let preview: String = prompt.chars().take(50).collect();
    info!(user = %username, model = %model, "LLM call: {}...", preview);
}
