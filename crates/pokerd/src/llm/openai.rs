//! OpenAI chat-completions provider.

use crate::llm::{parser, Provider, ProviderError, ProviderReply};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const SYSTEM_PROMPT: &str =
    "You are a professional poker advisor providing optimal GTO-based recommendations.";

pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(endpoint: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn attempt(&self, prompt: &str) -> Result<ProviderReply, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;

        debug!("Calling OpenAI API ({})", self.model);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.7,
            "max_tokens": 1000,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {} from OpenAI",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Invalid response body: {}", e)))?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| ProviderError::Malformed("No message content".to_string()))?;

        parser::parse_provider_reply(content)
            .ok_or_else(|| ProviderError::Malformed("No valid JSON in OpenAI reply".to_string()))
    }
}
