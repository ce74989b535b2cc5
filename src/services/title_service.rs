use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ChatMessage;
use crate::services::llm_service::{ModelRouter, RouterReply};
use crate::store::ChatStore;

/// Summarizes the opening exchange of a thread into a short title.
pub struct TitleGenerator {
    store: Arc<dyn ChatStore>,
    router: Arc<ModelRouter>,
    model: String,
}

impl TitleGenerator {
    pub fn new(store: Arc<dyn ChatStore>, router: Arc<ModelRouter>, model: impl Into<String>) -> Self {
        Self {
            store,
            router,
            model: model.into(),
        }
    }

    /// Never fails the caller. On any problem the title stays empty and a later trigger may retry.
    pub async fn generate_title(&self, thread_id: Uuid) {
        match self.try_generate(thread_id).await {
            Ok(Some(title)) => info!("Thread {} titled {:?}", thread_id, title),
            Ok(None) => {}
            Err(e) => warn!("Title generation failed for thread {}: {}", thread_id, e),
        }
    }

    async fn try_generate(&self, thread_id: Uuid) -> Result<Option<String>, AppError> {
        let thread = self
            .store
            .find_thread(thread_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

        if thread.has_title() {
            return Ok(None);
        }

        let opening = self.store.thread_messages(thread_id, Some(2)).await?;
        let prompt = build_title_prompt(&opening);

        let title = match self.router.resolve(&self.model, &prompt).await? {
            RouterReply::Text(text) => clean_title(&text),
            RouterReply::Degraded { provider, detail } => {
                warn!("Skipping title for thread {}: {} unavailable ({})", thread_id, provider, detail);
                return Ok(None);
            }
        };

        if title.is_empty() {
            return Ok(None);
        }

        self.store.set_thread_title(thread_id, &title).await?;
        Ok(Some(title))
    }
}

fn build_title_prompt(messages: &[ChatMessage]) -> String {
    let conversation = messages
        .iter()
        .map(|m| {
            format!(
                "User: {}\nAssistant: {}",
                m.message,
                m.response.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Given the following conversation, write a short, natural title that captures the main topic of the thread.
Use 3 to 5 words. Do not use colons or commas unless absolutely necessary. It should read like a person wrote it.
Examples: "Understanding Docker Basics", "World Capitals Overview", "Introduction to Machine Learning".

Conversation:
{}

Title:"#,
        conversation
    )
}

const MAX_TITLE_CHARS: usize = 255;

/// Strips surrounding whitespace and every double quote, capped to the column width.
fn clean_title(raw: &str) -> String {
    raw.trim().replace('"', "").chars().take(MAX_TITLE_CHARS).collect()
}
