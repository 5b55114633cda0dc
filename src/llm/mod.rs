//! Text-generation client.
//!
//! The core treats the model as prompt in, opaque text out. [`TextGenerator`]
//! is the seam; [`GeminiClient`] speaks the Gemini `generateContent` API.

use crate::config::LlmSettings;
use crate::error::{Result, ScopeError};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Returned when the service answers without any candidate text
pub const NO_AI_RESPONSE: &str = "No AI response.";

/// Anything that can turn a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Creates a client; a missing API key only fails at generation time
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| ScopeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        })
    }
}

/// Extracts `candidates[0].content.parts[0].text` from a response body
pub fn candidate_text(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"].as_str()
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ScopeError::Llm("Gemini API key not configured".into()))?;

        info!("Requesting text generation ({} prompt chars)", prompt.len());
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| ScopeError::Llm(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScopeError::Llm(format!(
                "Gemini API error: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScopeError::Llm(format!("invalid response body: {}", e)))?;
        debug!("Gemini response: {}", body);

        Ok(candidate_text(&body)
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_AI_RESPONSE)
            .to_string())
    }
}
