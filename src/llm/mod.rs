//! LLM Provider Layer
//!
//! One capability contract ("role-tagged messages in, generated text out")
//! over several remote text-generation providers with incompatible wire
//! formats. Concrete adapters live in `openai` and `gemini`; the
//! `registry` module holds the configured providers, the active selection
//! and the cross-provider fallback chain.

pub mod gemini;
pub mod openai;
pub mod registry;

pub use gemini::GeminiClient;
pub use openai::OpenAiCompatibleClient;
pub use registry::{Completion, ProviderInfo, ProviderRegistry};

use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A chat completion request, validated before it reaches any provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32, temperature: f32) -> Result<Self> {
        if messages.is_empty() {
            return Err(AnalystError::Config("completion request has no messages".to_string()));
        }
        if max_tokens == 0 {
            return Err(AnalystError::Config("max_tokens must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&temperature) {
            return Err(AnalystError::Config(format!(
                "temperature must be within [0, 1], got {}",
                temperature
            )));
        }
        Ok(Self { messages, max_tokens, temperature })
    }
}

/// Supported provider vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "xai")]
    XAi,
    Groq,
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// Registration order used when providers are bootstrapped from the environment.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::XAi,
        ProviderKind::Groq,
        ProviderKind::Gemini,
        ProviderKind::OpenAi,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::XAi => "xai",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::XAi => "XAI_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn models(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::XAi => &["grok-2-1212", "grok-2-vision-1212", "grok-beta", "grok-vision-beta"],
            ProviderKind::Groq => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-70b-versatile",
                "llama-3.1-8b-instant",
                "mixtral-8x7b-32768",
                "gemma2-9b-it",
            ],
            ProviderKind::Gemini => &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"],
            ProviderKind::OpenAi => &["gpt-4o-mini", "gpt-4o"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "xai" | "grok" => Ok(ProviderKind::XAi),
            "groq" => Ok(ProviderKind::Groq),
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(AnalystError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

/// Capability every provider adapter implements.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    fn list_models(&self) -> Vec<String>;

    fn default_model(&self) -> Option<String> {
        self.list_models().into_iter().next()
    }

    /// Send the request with the given model and return the first reply's text.
    async fn chat_completion(&self, model: &str, request: &CompletionRequest) -> Result<String>;
}

/// Build the provider adapter for a configured vendor.
pub fn client_for(kind: ProviderKind, api_key: String, timeout: std::time::Duration) -> Result<Box<dyn LlmProvider>> {
    let client: Box<dyn LlmProvider> = match kind {
        ProviderKind::Gemini => Box::new(GeminiClient::new(api_key, timeout)?),
        other => Box::new(OpenAiCompatibleClient::for_kind(other, api_key, timeout)?),
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_out_of_range_temperature() {
        let msgs = vec![ChatMessage::user("hi")];
        assert!(CompletionRequest::new(msgs.clone(), 100, 1.5).is_err());
        assert!(CompletionRequest::new(msgs.clone(), 100, -0.1).is_err());
        assert!(CompletionRequest::new(msgs.clone(), 0, 0.1).is_err());
        assert!(CompletionRequest::new(Vec::new(), 10, 0.1).is_err());
        assert!(CompletionRequest::new(msgs, 1, 1.0).is_ok());
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Grok".parse::<ProviderKind>().unwrap(), ProviderKind::XAi);
        assert_eq!(" groq ".parse::<ProviderKind>().unwrap(), ProviderKind::Groq);
        assert_eq!("GEMINI".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_default_model_is_first_listed() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.default_model(), kind.models()[0]);
        }
        assert_eq!(ProviderKind::XAi.default_model(), "grok-2-1212");
    }
}
