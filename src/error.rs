use std::fmt;
use thiserror::Error;

/// One failed attempt against a provider during a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("All AI providers failed: {}", format_attempts(.attempts))]
    AllProvidersFailed { attempts: Vec<ProviderFailure> },

    #[error("SQL synthesis failed: {reason}. Query: {query}")]
    Synthesis {
        reply: String,
        query: String,
        reason: String,
    },

    #[error("Query execution failed: {message}. Query: {query}{}", format_suggestion(.suggestion))]
    Execution {
        query: String,
        message: String,
        suggestion: Option<String>,
    },

    #[error("Interpretation error: {0}")]
    Interpretation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl AnalystError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Names of the providers involved in a provider failure, if any.
    pub fn failed_providers(&self) -> Vec<&str> {
        match self {
            Self::Provider { provider, .. } => vec![provider.as_str()],
            Self::AllProvidersFailed { attempts } => {
                attempts.iter().map(|a| a.provider.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// The query text attached to synthesis and execution failures.
    pub fn query_text(&self) -> Option<&str> {
        match self {
            Self::Synthesis { query, .. } | Self::Execution { query, .. } => Some(query),
            _ => None,
        }
    }
}

impl From<polars::error::PolarsError> for AnalystError {
    fn from(e: polars::error::PolarsError) -> Self {
        Self::Polars(e.to_string())
    }
}

impl From<rusqlite::Error> for AnalystError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

fn format_attempts(attempts: &[ProviderFailure]) -> String {
    if attempts.is_empty() {
        return "no providers were attempted".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_suggestion(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(column) => format!(" (did you mean `{}`?)", column),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, AnalystError>;
