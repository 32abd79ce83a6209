//! Google Gemini adapter.
//!
//! Gemini has no chat roles beyond `user` and `model` and no system turn, so
//! requests are translated into a `contents` list and replies are read back
//! out of the nested `candidates` array.

use super::{ChatMessage, CompletionRequest, LlmProvider, ProviderKind, Role};
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalystError::provider("gemini", format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::System | Role::User => "user",
        Role::Assistant => "model",
    }
}

pub(crate) fn convert_messages(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": gemini_role(m.role),
                "parts": [{"text": m.content}],
            })
        })
        .collect()
}

pub(crate) fn build_request_body(request: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "contents": convert_messages(&request.messages),
        "generationConfig": {
            "temperature": request.temperature,
            "maxOutputTokens": request.max_tokens,
        }
    })
}

pub(crate) fn extract_text(response_json: &serde_json::Value) -> std::result::Result<String, String> {
    if let Some(error) = response_json.get("error") {
        return Err(format!("API error: {}", error));
    }

    let text = response_json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| "Error parsing Gemini response: no candidate text".to_string())?
        .trim();

    if text.is_empty() {
        return Err("Empty candidate text in response".to_string());
    }
    Ok(text.to_string())
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn list_models(&self) -> Vec<String> {
        ProviderKind::Gemini.models().iter().map(|m| m.to_string()).collect()
    }

    async fn chat_completion(&self, model: &str, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&build_request_body(request))
            .send()
            .await
            .map_err(|e| AnalystError::provider("gemini", format!("API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalystError::provider("gemini", format!("API error ({}): {}", status, error_text)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnalystError::provider("gemini", format!("Failed to parse response: {}", e)))?;

        let text = extract_text(&response_json).map_err(|e| AnalystError::provider("gemini", e))?;
        debug!("gemini ({}) raw reply: {}", model, text);
        info!("gemini ({}) request successful", model);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_turn_becomes_user() {
        let contents = convert_messages(&[
            ChatMessage::system("rules"),
            ChatMessage::user("question"),
            ChatMessage::assistant("answer"),
        ]);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "rules");
        assert_eq!(contents[1]["role"], "user");
        assert_eq!(contents[2]["role"], "model");
    }

    #[test]
    fn test_generation_config() {
        let req = CompletionRequest::new(vec![ChatMessage::user("q")], 400, 0.3).unwrap();
        let body = build_request_body(&req);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 400);
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_candidate_text() {
        let reply = serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "SELECT * FROM data\n"}]}}]
        });
        assert_eq!(extract_text(&reply).unwrap(), "SELECT * FROM data");
        assert!(extract_text(&serde_json::json!({"candidates": []})).is_err());
        assert!(extract_text(&serde_json::json!({"error": {"code": 400}})).is_err());
    }
}
