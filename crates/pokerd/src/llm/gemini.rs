//! Gemini generateContent provider.

use crate::llm::{parser, Provider, ProviderError, ProviderReply};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn attempt(&self, prompt: &str) -> Result<ProviderReply, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;

        debug!("Calling Gemini API");

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Transport(format!(
                "HTTP {} from Gemini",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Invalid response body: {}", e)))?;

        let content = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|c| c.as_str())
            .ok_or_else(|| ProviderError::Malformed("No candidate text".to_string()))?;

        parser::parse_provider_reply(content)
            .ok_or_else(|| ProviderError::Malformed("No valid JSON in Gemini reply".to_string()))
    }
}
