//! Data Assistant - answers a natural-language question about a dataset
//!
//! One question runs three steps in order:
//! 1. synthesis: the provider chain writes a query over the dataset's columns
//! 2. execution: the query runs against a throwaway in-process engine
//! 3. interpretation: the provider chain explains the result
//!
//! Steps 1 and 2 abort the request on failure. Step 3 never does; its
//! failure is replaced by a fixed placeholder explanation.

use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::db::{HistoryEntry, HistoryStore};
use crate::error::{AnalystError, Result};
use crate::execution::QueryResult;
use crate::interpreter::ResultInterpreter;
use crate::llm::ProviderRegistry;
use crate::sql_engine::QueryExecutor;
use crate::sql_synthesizer::SqlSynthesizer;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Provider and model that produced the synthesized query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredBy {
    pub provider: String,
    pub model: String,
}

/// Response from the data assistant
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub question: String,

    /// Query that was executed
    pub sql: String,

    pub result: QueryResult,

    /// Plain-prose explanation, or the placeholder text
    pub explanation: String,

    /// False when `explanation` is the placeholder
    pub interpretation_available: bool,

    pub answered_by: AnsweredBy,
}

impl AnalysisResponse {
    /// Whole response as JSON, result rows included.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(result) = value.get_mut("result").and_then(|r| r.as_object_mut()) {
            result.insert("rows".to_string(), self.result.to_json()?);
        }
        Ok(value)
    }
}

pub struct DataAssistant {
    registry: ProviderRegistry,
    synthesizer: SqlSynthesizer,
    executor: QueryExecutor,
    interpreter: ResultInterpreter,
    history: Option<HistoryStore>,
}

impl DataAssistant {
    pub fn new(registry: ProviderRegistry, table_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            registry,
            synthesizer: SqlSynthesizer::new(),
            executor: QueryExecutor::new(table_name, timeout),
            interpreter: ResultInterpreter::new(),
            history: None,
        }
    }

    /// Registry, executor and (when a path is configured) history store from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = ProviderRegistry::from_config(config)?;
        let mut assistant = Self::new(registry, config.table_name.clone(), config.request_timeout);

        if let Some(path) = &config.history_path {
            assistant.history = Some(HistoryStore::open(path)?);
        }

        Ok(assistant)
    }

    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.registry
    }

    pub fn history(&self) -> Option<&HistoryStore> {
        self.history.as_ref()
    }

    pub fn table_name(&self) -> &str {
        self.executor.table_name()
    }

    pub async fn ask(&self, dataset: &Dataset, question: &str) -> Result<AnalysisResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnalystError::Config("question must not be empty".to_string()));
        }

        info!("Processing question on {}: {}", dataset.name(), question);

        let outcome = self.run(dataset, question).await;
        match &outcome {
            Ok(response) => self.record(HistoryEntry::succeeded(
                question,
                &response.sql,
                response.result.row_count,
                &response.explanation,
            )),
            Err(e) => self.record(HistoryEntry::failed(question, e.query_text(), &e.to_string())),
        }
        outcome
    }

    async fn run(&self, dataset: &Dataset, question: &str) -> Result<AnalysisResponse> {
        let synthesized = self
            .synthesizer
            .generate_query(&self.registry, question, &dataset.column_names(), self.table_name())
            .await?;

        let result = self.executor.execute(dataset, &synthesized.sql).await?;

        let explanation = self
            .interpreter
            .explain(&self.registry, question, &synthesized.sql, &result)
            .await;

        Ok(AnalysisResponse {
            question: question.to_string(),
            sql: synthesized.sql,
            result,
            explanation: explanation.text,
            interpretation_available: explanation.available,
            answered_by: AnsweredBy {
                provider: synthesized.provider,
                model: synthesized.model,
            },
        })
    }

    fn record(&self, entry: HistoryEntry) {
        if let Some(history) = &self.history {
            if let Err(e) = history.record(&entry) {
                warn!("Failed to record analysis history: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset() -> Dataset {
        Dataset::new("t", df!["Tenure" => [1i64, 2, 3]].unwrap())
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let assistant = DataAssistant::new(ProviderRegistry::new(), "data", Duration::from_secs(5));
        assert!(matches!(
            assistant.ask(&dataset(), "   ").await,
            Err(AnalystError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_is_recorded() {
        let assistant = DataAssistant::new(ProviderRegistry::new(), "data", Duration::from_secs(5))
            .with_history(HistoryStore::open_in_memory().unwrap());

        assert!(assistant.ask(&dataset(), "Average Tenure").await.is_err());

        let entries = assistant.history().unwrap().recent(5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "Average Tenure");
        assert_eq!(entries[0].status, crate::db::HistoryStatus::Failed);
    }
}
