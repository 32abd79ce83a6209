//! Query Executor
//!
//! Runs a synthesized query against a dataset. Each call builds a fresh
//! polars `SQLContext`, registers the dataset under the configured table
//! name, collects the result and drops the context; nothing survives
//! between calls.

use crate::config::DEFAULT_TABLE_NAME;
use crate::dataset::Dataset;
use crate::error::{AnalystError, Result};
use crate::execution::QueryResult;
use polars::prelude::*;
use polars::sql::SQLContext;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const SUGGESTION_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    table_name: String,
    timeout: Duration,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_NAME, Duration::from_secs(30))
    }
}

impl QueryExecutor {
    pub fn new(table_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            table_name: table_name.into(),
            timeout,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Execute `sql` on a blocking worker, bounded by the executor timeout.
    pub async fn execute(&self, dataset: &Dataset, sql: &str) -> Result<QueryResult> {
        let frame = dataset.frame().clone();
        let table_name = self.table_name.clone();
        let query = sql.to_string();

        let task = tokio::task::spawn_blocking(move || run_query(&table_name, frame, &query));

        let outcome = tokio::time::timeout(self.timeout, task).await.map_err(|_| {
            AnalystError::Execution {
                query: sql.to_string(),
                message: format!("query timed out after {:?}", self.timeout),
                suggestion: None,
            }
        })?;

        let result = outcome
            .map_err(|e| AnalystError::Execution {
                query: sql.to_string(),
                message: format!("query worker failed: {}", e),
                suggestion: None,
            })?
            .map_err(|message| {
                let suggestion = suggest_column(&message, &dataset.column_names());
                warn!("Error executing query: {}", message);
                AnalystError::Execution {
                    query: sql.to_string(),
                    message,
                    suggestion,
                }
            })?;

        info!(
            "Query executed successfully: {} rows returned in {}ms",
            result.row_count, result.execution_time_ms
        );
        Ok(result)
    }

    /// Execute `sql` on the calling thread.
    pub fn execute_blocking(&self, dataset: &Dataset, sql: &str) -> Result<QueryResult> {
        run_query(&self.table_name, dataset.frame().clone(), sql).map_err(|message| {
            let suggestion = suggest_column(&message, &dataset.column_names());
            AnalystError::Execution {
                query: sql.to_string(),
                message,
                suggestion,
            }
        })
    }
}

fn run_query(table_name: &str, frame: DataFrame, sql: &str) -> std::result::Result<QueryResult, String> {
    let start_time = Instant::now();

    let mut ctx = SQLContext::new();
    ctx.register(table_name, frame.lazy());

    let data = ctx
        .execute(sql)
        .and_then(|lf| lf.collect())
        .map_err(|e| e.to_string())?;

    Ok(QueryResult::new(data, start_time.elapsed().as_millis() as u64))
}

/// Closest known column to the identifier named in a "not found" error.
fn suggest_column(message: &str, columns: &[String]) -> Option<String> {
    let lower = message.to_lowercase();
    let mentions_missing = ["not found", "unable to find", "invalid", "unknown", "no column"]
        .iter()
        .any(|needle| lower.contains(needle));
    if !mentions_missing {
        return None;
    }

    let missing = extract_identifier(message)?;
    columns
        .iter()
        .filter(|c| **c != missing)
        .map(|c| (c, strsim::normalized_levenshtein(&c.to_lowercase(), &missing.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| c.clone())
}

/// First quoted identifier in an engine error message.
fn extract_identifier(message: &str) -> Option<String> {
    for quote in ['"', '\'', '`'] {
        let mut parts = message.split(quote);
        parts.next()?;
        if let Some(candidate) = parts.next() {
            let candidate = candidate.trim();
            if !candidate.is_empty() && candidate.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let df = df![
            "Device" => ["Phone", "Computer", "Phone", "Phone"],
            "Gender" => ["F", "M", "M", "F"],
            "Tenure" => [4i64, 10, 6, 8]
        ]
        .unwrap();
        Dataset::new("customers", df)
    }

    #[test]
    fn test_execute_filter() {
        let executor = QueryExecutor::default();
        let result = executor
            .execute_blocking(&dataset(), "SELECT Device, Tenure FROM data WHERE Tenure > 5")
            .unwrap();
        assert_eq!(result.row_count, 3);
        assert_eq!(result.columns, vec!["Device", "Tenure"]);
    }

    #[test]
    fn test_custom_table_name() {
        let executor = QueryExecutor::new("customers", Duration::from_secs(5));
        let result = executor
            .execute_blocking(&dataset(), "SELECT * FROM customers")
            .unwrap();
        assert_eq!(result.row_count, 4);
        assert!(executor.execute_blocking(&dataset(), "SELECT * FROM data").is_err());
    }

    #[test]
    fn test_unknown_column_reports_query() {
        let sql = "SELECT Devise FROM data";
        let err = QueryExecutor::default().execute_blocking(&dataset(), sql).unwrap_err();
        match err {
            AnalystError::Execution { query, .. } => assert_eq!(query, sql),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_suggest_column() {
        let columns = vec!["Device".to_string(), "Gender".to_string()];
        assert_eq!(
            suggest_column("ColumnNotFound: \"Devise\" not found", &columns),
            Some("Device".to_string())
        );
        assert_eq!(suggest_column("ColumnNotFound: \"zzz\" not found", &columns), None);
        assert_eq!(suggest_column("syntax error near GROUP", &columns), None);
    }

    #[test]
    fn test_order_by_aggregate_alias() {
        let result = QueryExecutor::default()
            .execute_blocking(
                &dataset(),
                "SELECT Device, COUNT(*) as count FROM data GROUP BY Device ORDER BY count DESC LIMIT 1",
            )
            .unwrap();
        assert_eq!(result.row_count, 1);
        let json = result.to_json().unwrap();
        assert_eq!(json[0]["Device"], "Phone");
        assert_eq!(json[0]["count"], 3);
    }

    #[tokio::test]
    async fn test_execute_async() {
        let result = QueryExecutor::default()
            .execute(&dataset(), "SELECT Gender, COUNT(*) AS n FROM data GROUP BY Gender")
            .await
            .unwrap();
        assert_eq!(result.row_count, 2);
    }
}
