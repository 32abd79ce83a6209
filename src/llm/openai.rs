//! OpenAI-compatible chat completions adapter.
//!
//! xAI, Groq and OpenAI all speak the same `/chat/completions` protocol and
//! differ only in base URL, provider name and model catalogue.

use super::{CompletionRequest, LlmProvider, ProviderKind};
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    kind: ProviderKind,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn for_kind(kind: ProviderKind, api_key: String, timeout: Duration) -> Result<Self> {
        let base_url = match kind {
            ProviderKind::XAi => "https://api.x.ai/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Gemini => {
                return Err(AnalystError::Config(
                    "gemini does not speak the chat completions protocol".to_string(),
                ))
            }
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalystError::provider(kind.id(), format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            kind,
            api_key,
            base_url: base_url.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn err(&self, message: impl Into<String>) -> AnalystError {
        AnalystError::provider(self.kind.id(), message)
    }
}

pub(crate) fn build_request_body(model: &str, request: &CompletionRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
        .collect();

    serde_json::json!({
        "model": model,
        "messages": messages,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
    })
}

/// Pull the first choice's text out of a chat completions reply.
pub(crate) fn extract_content(response_json: &serde_json::Value) -> std::result::Result<String, String> {
    if let Some(error) = response_json.get("error") {
        return Err(format!("API error: {}", error));
    }

    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| "No choices array in response".to_string())?;

    let first = choices
        .first()
        .ok_or_else(|| "Empty choices array in response".to_string())?;

    if first.get("finish_reason").and_then(|r| r.as_str()) == Some("content_filter") {
        return Err("Response was filtered by content policy".to_string());
    }

    let content = first["message"]["content"]
        .as_str()
        .ok_or_else(|| "No content in response".to_string())?
        .trim();

    if content.is_empty() {
        return Err("Empty content in response".to_string());
    }

    Ok(content.to_string())
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        self.kind.id()
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn list_models(&self) -> Vec<String> {
        self.kind.models().iter().map(|m| m.to_string()).collect()
    }

    async fn chat_completion(&self, model: &str, request: &CompletionRequest) -> Result<String> {
        let body = build_request_body(model, request);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.err(format!("API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(self.err(format!("API error ({}): {}", status, error_text)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.err(format!("Failed to parse response: {}", e)))?;

        if response_json["choices"][0]["finish_reason"].as_str() == Some("length") {
            warn!("{} ({}) reply was truncated at the token limit", self.kind, model);
        }

        let content = extract_content(&response_json).map_err(|e| self.err(e))?;
        debug!("{} ({}) raw reply: {}", self.kind, model, content);
        info!("{} ({}) request successful", self.kind, model);
        Ok(content)
    }
}
