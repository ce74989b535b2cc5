pub mod llm_provider;
pub mod gemini;
pub mod openai;
