//! Provider Registry
//!
//! Holds the configured providers in registration order plus the one
//! "active" (provider, model) selection. A call goes to the active provider
//! first; on failure every other provider is tried once, in registration
//! order, with its first listed model. There are no retries within a single
//! provider.

use super::{client_for, ChatMessage, CompletionRequest, LlmProvider};
use crate::config::AppConfig;
use crate::error::{AnalystError, ProviderFailure, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Text produced by a provider, tagged with who actually answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub active_provider: Option<String>,
    pub active_model: Option<String>,
    pub available_providers: Vec<String>,
    pub total_providers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSelection {
    provider: String,
    model: String,
}

#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn LlmProvider>>,
    active: Option<ActiveSelection>,
    call_timeout: Duration,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            active: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Build a registry from configuration: one client per configured
    /// provider, then the configured default (or the first provider) made active.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new().with_timeout(config.request_timeout);

        for provider in &config.providers {
            let client = client_for(provider.kind, provider.api_key.clone(), config.request_timeout)?;
            registry.register(Arc::from(client));
            info!("{} client initialized", provider.kind);
        }

        let Some(first) = config.providers.first() else {
            return Ok(registry);
        };

        let default = config
            .default_provider
            .filter(|kind| config.providers.iter().any(|p| p.kind == *kind));
        if config.default_provider.is_some() && default.is_none() {
            warn!(
                "Default provider {:?} is not configured, falling back to {}",
                config.default_provider.map(|k| k.id()),
                first.kind
            );
        }

        let kind = default.unwrap_or(first.kind);
        // DEFAULT_AI_MODEL belongs to the requested provider; drop it when that provider is missing.
        let requested_model = if config.default_provider.is_none() || default.is_some() {
            config.default_model.clone()
        } else {
            None
        };
        let model = requested_model.or_else(|| {
            config
                .providers
                .iter()
                .find(|p| p.kind == kind)
                .and_then(|p| p.model.clone())
        });
        registry.set_active(kind.id(), model.as_deref())?;

        Ok(registry)
    }

    /// Register a provider. Re-registering a name replaces the client in place.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        if let Some(slot) = self.providers.iter_mut().find(|p| p.name() == provider.name()) {
            *slot = provider;
        } else {
            self.providers.push(provider);
        }
    }

    /// Select the provider (and model) tried first. Without a model the
    /// provider's default model is used.
    pub fn set_active(&mut self, provider: &str, model: Option<&str>) -> Result<()> {
        let name = provider.trim().to_lowercase();
        let client = self.get(&name).ok_or_else(|| {
            AnalystError::Config(format!(
                "Provider {} not initialized. Register it first",
                provider
            ))
        })?;

        let model = match model {
            Some(m) => m.to_string(),
            None => client.default_model().ok_or_else(|| {
                AnalystError::Config(format!("Provider {} has no models available", name))
            })?,
        };

        info!("Active provider set to: {} ({})", name, model);
        self.active = Some(ActiveSelection { provider: name, model });
        Ok(())
    }

    pub fn active(&self) -> Option<(&str, &str)> {
        self.active
            .as_ref()
            .map(|a| (a.provider.as_str(), a.model.as_str()))
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn models(&self, provider: &str) -> Vec<String> {
        self.get(provider).map(|p| p.list_models()).unwrap_or_default()
    }

    pub fn info(&self) -> ProviderInfo {
        ProviderInfo {
            active_provider: self.active.as_ref().map(|a| a.provider.clone()),
            active_model: self.active.as_ref().map(|a| a.model.clone()),
            available_providers: self.providers(),
            total_providers: self.providers.len(),
        }
    }

    fn get(&self, name: &str) -> Option<&Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Send messages through the fallback chain and return the reply text.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = CompletionRequest::new(messages, max_tokens, temperature)?;
        self.complete(&request).await.map(|c| c.text)
    }

    /// Like `chat_completion`, but reports which provider and model answered.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let active = self.active.as_ref().ok_or_else(|| {
            AnalystError::Config("No active provider set. Configure an AI provider first".to_string())
        })?;

        let mut attempts: Vec<ProviderFailure> = Vec::new();

        if let Some(client) = self.get(&active.provider) {
            match self.call(client.as_ref(), &active.model, request).await {
                Ok(text) => {
                    return Ok(Completion {
                        text,
                        provider: active.provider.clone(),
                        model: active.model.clone(),
                    })
                }
                Err(e) => {
                    warn!("{} failed: {}", active.provider, e);
                    attempts.push(failure(&active.provider, &e));
                }
            }
        }

        for client in self.providers.iter().filter(|p| p.name() != active.provider) {
            let Some(model) = client.default_model() else {
                attempts.push(ProviderFailure {
                    provider: client.name().to_string(),
                    message: "no models available".to_string(),
                });
                continue;
            };

            info!("Trying fallback provider: {} ({})", client.name(), model);
            match self.call(client.as_ref(), &model, request).await {
                Ok(text) => {
                    warn!(
                        "Request answered by fallback provider {} ({}) instead of {} ({})",
                        client.name(),
                        model,
                        active.provider,
                        active.model
                    );
                    return Ok(Completion {
                        text,
                        provider: client.name().to_string(),
                        model,
                    });
                }
                Err(e) => {
                    warn!("{} fallback failed: {}", client.name(), e);
                    attempts.push(failure(client.name(), &e));
                }
            }
        }

        Err(AnalystError::AllProvidersFailed { attempts })
    }

    async fn call(&self, client: &dyn LlmProvider, model: &str, request: &CompletionRequest) -> Result<String> {
        match tokio::time::timeout(self.call_timeout, client.chat_completion(model, request)).await {
            Ok(result) => result,
            Err(_) => Err(AnalystError::provider(
                client.name(),
                format!("request timed out after {:?}", self.call_timeout),
            )),
        }
    }
}

fn failure(provider: &str, error: &AnalystError) -> ProviderFailure {
    let message = match error {
        AnalystError::Provider { message, .. } => message.clone(),
        other => other.to_string(),
    };
    ProviderFailure {
        provider: provider.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider that answers with a fixed reply (or fails) and records the models it was asked for.
    struct FixedProvider {
        name: &'static str,
        reply: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FixedProvider {
        fn ok(name: &'static str, reply: &'static str) -> Arc<Self> {
            Arc::new(Self { name, reply: Some(reply), calls: Mutex::new(Vec::new()) })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, reply: None, calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        fn list_models(&self) -> Vec<String> {
            vec![format!("{}-small", self.name), format!("{}-large", self.name)]
        }

        async fn chat_completion(&self, model: &str, _request: &CompletionRequest) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            match self.reply {
                Some(r) => Ok(r.to_string()),
                None => Err(AnalystError::provider(self.name, "503 Service Unavailable")),
            }
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::user("q")], 50, 0.1).unwrap()
    }

    #[tokio::test]
    async fn test_active_provider_answers_first() {
        let a = FixedProvider::ok("alpha", "from alpha");
        let b = FixedProvider::ok("beta", "from beta");
        let mut registry = ProviderRegistry::new();
        registry.register(a.clone());
        registry.register(b.clone());
        registry.set_active("beta", Some("beta-large")).unwrap();

        let completion = registry.complete(&request()).await.unwrap();
        assert_eq!(completion.text, "from beta");
        assert_eq!(completion.model, "beta-large");
        assert!(a.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_uses_first_model_in_registration_order() {
        let a = FixedProvider::failing("alpha");
        let b = FixedProvider::failing("beta");
        let c = FixedProvider::ok("gamma", "from gamma");
        let mut registry = ProviderRegistry::new();
        registry.register(a.clone());
        registry.register(b.clone());
        registry.register(c.clone());
        registry.set_active("beta", Some("beta-large")).unwrap();

        let completion = registry.complete(&request()).await.unwrap();
        assert_eq!(completion.provider, "gamma");
        assert_eq!(completion.model, "gamma-small");
        assert_eq!(b.calls(), vec!["beta-large"]);
        assert_eq!(a.calls(), vec!["alpha-small"]);
    }

    #[tokio::test]
    async fn test_all_failures_are_aggregated() {
        let mut registry = ProviderRegistry::new();
        registry.register(FixedProvider::failing("alpha"));
        registry.register(FixedProvider::failing("beta"));
        registry.set_active("alpha", None).unwrap();

        let err = registry.complete(&request()).await.unwrap_err();
        match err {
            AnalystError::AllProvidersFailed { attempts } => {
                let names: Vec<_> = attempts.iter().map(|a| a.provider.as_str()).collect();
                assert_eq!(names, vec!["alpha", "beta"]);
                assert!(attempts[0].message.contains("503"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_active_provider() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.complete(&request()).await,
            Err(AnalystError::Config(_))
        ));
    }

    #[test]
    fn test_set_active_requires_registration() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.set_active("alpha", None).is_err());
        registry.register(FixedProvider::ok("alpha", "x"));
        registry.set_active("ALPHA", None).unwrap();
        assert_eq!(registry.active(), Some(("alpha", "alpha-small")));
    }

    #[test]
    fn test_reregistering_keeps_position() {
        let mut registry = ProviderRegistry::new();
        registry.register(FixedProvider::ok("alpha", "x"));
        registry.register(FixedProvider::ok("beta", "y"));
        registry.register(FixedProvider::ok("alpha", "z"));
        assert_eq!(registry.providers(), vec!["alpha", "beta"]);
        assert_eq!(registry.info().total_providers, 2);
    }
}
