use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::LlmError;
use crate::external::llm_provider::LlmProvider;

/// Provider double with a canned outcome that records every call.
pub struct FakeProvider {
    name: &'static str,
    outcome: Result<String, LlmError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn replying(name: &'static str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, error: LlmError) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `(model, prompt)` pairs in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.lock().push((model.to_string(), prompt.to_string()));
        self.outcome.clone()
    }
}
