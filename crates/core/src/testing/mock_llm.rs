//! Mock LLM client for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::caption::{CompletionRequest, CompletionResponse, LlmClient, LlmError};

/// Mock implementation of the LlmClient trait.
///
/// Returns a scripted response or a scripted failure, and records every
/// prompt for assertions.
pub struct MockLlm {
    response: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    /// A mock that answers every completion with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A mock that fails every completion.
    pub fn failing() -> Self {
        Self {
            response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All prompts seen so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt);

        match &self.response {
            Some(text) => Ok(CompletionResponse {
                text: text.clone(),
                model: "mock-model".to_string(),
            }),
            None => Err(LlmError::Api {
                status: 500,
                message: "mock failure".to_string(),
            }),
        }
    }
}
