//! Mock LLM client for testing without real API calls.

use async_trait::async_trait;

use nutrilog_core::{
    traits::{LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

/// Mock client returning a canned reply, or failing on demand.
pub struct MockLlmClient {
    /// Reply to return verbatim.
    response: String,
    /// Simulate transport failure.
    should_fail: bool,
}

impl MockLlmClient {
    /// Create a mock that answers every call with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            should_fail: false,
        }
    }

    /// Create a mock that fails every call.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }

    fn respond(&self) -> Result<LlmResponse> {
        if self.should_fail {
            return Err(Error::model_provider("mock failure"));
        }

        Ok(LlmResponse {
            content: self.response.clone(),
            finish_reason: "stop".to_string(),
            usage: LlmUsage {
                prompt_tokens: 0,
                completion_tokens: self.response.len() as u64 / 4,
                total_tokens: self.response.len() as u64 / 4,
            },
        })
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<LlmResponse> {
        self.respond()
    }

    async fn complete_with_image(
        &self,
        _prompt: &str,
        _image_data_uri: &str,
    ) -> Result<LlmResponse> {
        self.respond()
    }
}
