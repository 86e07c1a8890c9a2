//! OpenAI-compatible chat-completions client.
//!
//! One synchronous-feeling call per request: no retry, no backoff. Transport
//! and HTTP-status failures surface as `Error::ModelProvider`; the analyzer
//! decides what to do with them.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};

use nutrilog_core::{
    config::ModelConfig,
    traits::{LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

/// Configuration for the chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// API base, e.g. `https://api.sambanova.ai/v1`.
    pub base_url: String,
    /// Model identifier; must be vision-capable for photo analysis.
    pub model: String,
    pub api_key: Option<Secret<String>>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl OpenAiCompatConfig {
    pub fn from_model_config(config: &ModelConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Chat-completions client over reqwest.
pub struct OpenAiCompatClient {
    config: OpenAiCompatConfig,
    http: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::model_provider(format!("HTTP client build failed: {e}")))?;

        Ok(Self { config, http })
    }

    async fn chat(&self, user_content: Value) -> Result<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| Error::model_provider("model API key not configured"))?;

        let request_body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": user_content }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.config.model, url = %url, "Calling chat completions");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::model_provider(format!("chat completions call failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::model_provider(format!(
                "chat completions returned {status}: {body}"
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| Error::model_provider(format!("unreadable completion body: {e}")))?;

        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::model_provider("completion without message content"))?
            .to_string();
        let finish_reason = reply["choices"][0]["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();
        let usage = LlmUsage {
            prompt_tokens: reply["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: reply["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: reply["usage"]["total_tokens"].as_u64().unwrap_or(0),
        };

        tracing::debug!(
            content_len = content.len(),
            total_tokens = usage.total_tokens,
            "Completion received"
        );

        Ok(LlmResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        self.chat(json!(prompt)).await
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image_data_uri: &str,
    ) -> Result<LlmResponse> {
        let content = json!([
            { "type": "text", "text": prompt },
            { "type": "image_url", "image_url": { "url": image_data_uri } }
        ]);
        self.chat(content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OpenAiCompatConfig {
        OpenAiCompatConfig {
            base_url: "https://api.example.test/v1/".into(),
            model: "vision-model".into(),
            api_key: None,
            max_tokens: 1500,
            temperature: 0.4,
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_client_builds_without_key() {
        // Key absence is a call-time error, not a construction error.
        assert!(OpenAiCompatClient::new(config()).is_ok());
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_as_provider_error() {
        let client = OpenAiCompatClient::new(config()).unwrap();
        let result = client.complete("hello").await;
        assert!(matches!(result, Err(Error::ModelProvider(_))));
    }
}
