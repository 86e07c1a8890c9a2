//! Model gateway traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// LLM client interface.
///
/// One implementation per transport; the analyzer only ever sees this trait.
/// Calls are single-attempt: no retry or backoff happens behind the seam,
/// and a transport failure surfaces as `Error::ModelProvider` for the caller
/// to route to its fallback.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a text completion.
    async fn complete(&self, prompt: &str) -> Result<LlmResponse>;

    /// Generate a completion for a prompt plus one image.
    ///
    /// `image_data_uri` is a `data:image/jpeg;base64,...` URI ready for
    /// embedding in a multimodal message.
    async fn complete_with_image(&self, prompt: &str, image_data_uri: &str)
        -> Result<LlmResponse>;
}

/// Response from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated content.
    pub content: String,
    /// Finish reason.
    pub finish_reason: String,
    /// Token usage.
    pub usage: LlmUsage,
}

/// Token usage from an LLM call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}
