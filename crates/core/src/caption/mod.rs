//! Caption generation: an LLM-backed generator with static fallbacks.

mod generator;
mod llm;

pub use generator::{extract_hashtags, CaptionGenerator};
pub use llm::{CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError};
