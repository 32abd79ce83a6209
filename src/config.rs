//! Runtime configuration.
//!
//! Provider credentials and pipeline settings come from the process
//! environment (a `.env` file is loaded by the binary before this runs).

use crate::error::{AnalystError, Result};
use crate::llm::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TABLE_NAME: &str = "data";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and model selection for one provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Configured providers in registration order.
    pub providers: Vec<ProviderConfig>,
    pub default_provider: Option<ProviderKind>,
    pub default_model: Option<String>,
    /// Ceiling for each provider call and for query execution.
    pub request_timeout: Duration,
    pub table_name: String,
    pub history_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            default_provider: None,
            default_model: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            history_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let providers: Vec<ProviderConfig> = ProviderKind::ALL
            .iter()
            .filter_map(|kind| {
                get(kind.api_key_var()).map(|api_key| ProviderConfig {
                    kind: *kind,
                    api_key,
                    model: None,
                })
            })
            .collect();

        let default_provider = match get("DEFAULT_AI_PROVIDER") {
            Some(value) => match value.parse::<ProviderKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    warn!("Ignoring DEFAULT_AI_PROVIDER: {}", e);
                    None
                }
            },
            None => None,
        };

        let request_timeout = match get("ANALYST_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| {
                    AnalystError::Config(format!("ANALYST_TIMEOUT_SECS must be a whole number, got {}", value))
                })?;
                if secs == 0 {
                    return Err(AnalystError::Config("ANALYST_TIMEOUT_SECS must be positive".to_string()));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let table_name = get("ANALYST_TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
        validate_table_name(&table_name)?;

        Ok(Self {
            providers,
            default_provider,
            default_model: get("DEFAULT_AI_MODEL"),
            request_timeout,
            table_name,
            history_path: get("ANALYST_HISTORY_DB").map(PathBuf::from),
        })
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }
}

/// Table names are spliced into SQL text, so only plain identifiers are allowed.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AnalystError::Config(format!("Invalid table name: {:?}", name)))
    }
}
