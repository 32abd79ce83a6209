//! Result Interpreter
//!
//! Asks the provider chain for a short plain-prose explanation of a query
//! result. Only the first rows are sent. A failure here never fails the
//! request: the caller already has the result table.

use crate::error::{AnalystError, Result};
use crate::execution::QueryResult;
use crate::llm::{ChatMessage, CompletionRequest, ProviderRegistry};
use tracing::{info, warn};

pub const INTERPRETATION_UNAVAILABLE: &str =
    "Results retrieved successfully, but an AI interpretation is unavailable right now.";

/// Interpretation text and whether a provider actually produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    pub available: bool,
}

#[derive(Debug, Clone)]
pub struct ResultInterpreter {
    max_rows: usize,
    max_tokens: u32,
    temperature: f32,
}

impl Default for ResultInterpreter {
    fn default() -> Self {
        Self {
            max_rows: 10,
            max_tokens: 400,
            temperature: 0.3,
        }
    }
}

impl ResultInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_prompt(&self, question: &str, sql: &str, result: &QueryResult) -> Result<String> {
        let shown = result.row_count.min(self.max_rows);
        let preview = result.preview(self.max_rows)?;
        let truncation_note = if result.row_count > shown {
            format!(" (showing first {})", shown)
        } else {
            String::new()
        };

        Ok(format!(
            r#"Analyze the following query results and provide a clear, concise interpretation:

Original Question: {question}
SQL Query Used: {sql}
Results ({rows} rows{note}):
{preview}

Please provide:
1. A summary of what the data shows
2. Key insights or patterns
3. Direct answer to the original question

Keep the response clear and business-friendly. Do not use markdown formatting."#,
            question = question.trim(),
            sql = sql,
            rows = result.row_count,
            note = truncation_note,
            preview = preview,
        ))
    }

    /// Explanation text, or an `Interpretation` error when no provider could produce one.
    pub async fn try_interpret(
        &self,
        llm: &ProviderRegistry,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> Result<String> {
        let prompt = self.build_prompt(question, sql, result)?;
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)], self.max_tokens, self.temperature)?;
        let completion = llm
            .complete(&request)
            .await
            .map_err(|e| AnalystError::Interpretation(e.to_string()))?;

        info!("Interpretation generated by {} ({})", completion.provider, completion.model);
        Ok(completion.text.trim().to_string())
    }

    /// Explanation with the placeholder substituted on any failure.
    pub async fn explain(
        &self,
        llm: &ProviderRegistry,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> Explanation {
        match self.try_interpret(llm, question, sql, result).await {
            Ok(text) => Explanation { text, available: true },
            Err(e) => {
                warn!("Error generating interpretation: {}", e);
                Explanation {
                    text: INTERPRETATION_UNAVAILABLE.to_string(),
                    available: false,
                }
            }
        }
    }

    /// Explanation text; falls back to `INTERPRETATION_UNAVAILABLE` on any failure.
    pub async fn interpret(
        &self,
        llm: &ProviderRegistry,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> String {
        self.explain(llm, question, sql, result).await.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_prompt_truncates_to_ten_rows() {
        let values: Vec<i64> = (0..25).collect();
        let df = df!["value" => values].unwrap();
        let result = QueryResult::new(df, 1);

        let prompt = ResultInterpreter::new()
            .build_prompt("List values", "SELECT value FROM data", &result)
            .unwrap();

        assert!(prompt.contains("Results (25 rows (showing first 10)):"));
        assert!(prompt.contains("\n9\n"));
        assert!(!prompt.contains("\n10\n"));
        assert!(prompt.contains("Direct answer to the original question"));
    }

    #[tokio::test]
    async fn test_no_provider_falls_back() {
        let df = df!["n" => [1i64]].unwrap();
        let result = QueryResult::new(df, 1);
        let registry = ProviderRegistry::new();
        let interpreter = ResultInterpreter::new();

        assert!(interpreter
            .try_interpret(&registry, "q", "SELECT n FROM data", &result)
            .await
            .is_err());
        let text = interpreter.interpret(&registry, "q", "SELECT n FROM data", &result).await;
        assert_eq!(text, INTERPRETATION_UNAVAILABLE);

        let explanation = interpreter.explain(&registry, "q", "SELECT n FROM data", &result).await;
        assert!(!explanation.available);
        assert_eq!(explanation.text, INTERPRETATION_UNAVAILABLE);
    }
}
