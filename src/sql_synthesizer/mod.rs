//! SQL Synthesizer
//!
//! Turns a free-text question plus the dataset's column names into a single
//! retrieval query. The provider is prompted with the schema and a set of
//! question → SQL exemplars; its reply is then run through the `repair`
//! pipeline and validated before anything is executed.

pub mod repair;

use crate::error::{AnalystError, Result};
use crate::llm::{ChatMessage, CompletionRequest, ProviderRegistry};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A validated query together with the reply it was repaired from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedQuery {
    pub sql: String,
    pub raw_reply: String,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SqlSynthesizer {
    max_tokens: u32,
    temperature: f32,
}

impl Default for SqlSynthesizer {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.1,
        }
    }
}

impl SqlSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn build_prompt(question: &str, column_names: &[String], table_name: &str) -> String {
        let columns = column_names.iter().join(", ");

        format!(
            r#"You are an expert SQL query generator. Convert the user's question into a valid, complete, executable SQL query.

DATABASE SCHEMA:
Table name: {table}
Columns: {columns}

CRITICAL INSTRUCTIONS:
1. ALWAYS write a COMPLETE SQL query with SELECT, FROM, and any necessary clauses
2. Column names are CASE-SENSITIVE - use them EXACTLY as shown above
3. ALWAYS include "FROM {table}" in your query
4. Use only the columns listed above
5. Give every aggregate an alias (for example COUNT(*) as count) and ORDER BY that alias, never by the aggregate expression itself

QUERY PATTERNS:

For "most/common/popular [column]":
Example: "What is the most used PreferredLoginDevice?"
SQL: SELECT PreferredLoginDevice, COUNT(*) as count FROM {table} GROUP BY PreferredLoginDevice ORDER BY count DESC LIMIT 1

For "most [column] by [another column]":
Example: "What is the most PreferredLoginDevice by Gender?"
SQL: SELECT Gender, PreferredLoginDevice, COUNT(*) as count FROM {table} GROUP BY Gender, PreferredLoginDevice ORDER BY Gender, count DESC

For "breakdown/distribution by [column]":
Example: "Distribution by Gender"
SQL: SELECT Gender, COUNT(*) as count FROM {table} GROUP BY Gender

For "average/mean":
Example: "Average Tenure"
SQL: SELECT AVG(Tenure) as average FROM {table}

For "top N":
Example: "Top 5 by OrderCount"
SQL: SELECT * FROM {table} ORDER BY OrderCount DESC LIMIT 5

For "comparison":
Example: "Compare satisfaction by MaritalStatus"
SQL: SELECT MaritalStatus, AVG(SatisfactionScore) as avg_score FROM {table} GROUP BY MaritalStatus

For "total/count with filter":
Example: "How many churned?"
SQL: SELECT COUNT(*) as total FROM {table} WHERE Churn = 1

USER QUESTION: {question}

IMPORTANT: Return ONLY the complete SQL query. No explanations, no markdown, no code blocks, just the raw SQL query."#,
            table = table_name,
            columns = columns,
            question = question.trim(),
        )
    }

    /// Ask the provider chain for a query answering `question` over `table_name`.
    pub async fn generate_query(
        &self,
        llm: &ProviderRegistry,
        question: &str,
        column_names: &[String],
        table_name: &str,
    ) -> Result<SynthesizedQuery> {
        if column_names.is_empty() {
            return Err(AnalystError::Config("dataset has no columns to query".to_string()));
        }

        let prompt = Self::build_prompt(question, column_names, table_name);
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)], self.max_tokens, self.temperature)?;
        let completion = llm.complete(&request).await?;

        debug!("Raw AI response: {}", completion.text);
        let sql = Self::finalize(&completion.text, table_name)?;

        let sources = repair::source_tables(&sql);
        if !sources.iter().any(|t| t.eq_ignore_ascii_case(table_name)) {
            warn!("Synthesized query reads from {:?}, expected {}", sources, table_name);
        }

        info!("Final SQL query ({} / {}): {}", completion.provider, completion.model, sql);
        Ok(SynthesizedQuery {
            sql,
            raw_reply: completion.text,
            provider: completion.provider,
            model: completion.model,
        })
    }

    /// Repair a raw reply and validate the result.
    pub fn finalize(reply: &str, table_name: &str) -> Result<String> {
        let sql = repair::postprocess(reply, table_name);

        if !repair::has_source_clause(reply) && repair::has_source_clause(&sql) {
            info!("Fixed SQL with FROM clause: {}", sql);
        }

        repair::validate(&sql).map_err(|reason| {
            warn!("Invalid SQL ({}): {}", reason, sql);
            AnalystError::Synthesis {
                reply: reply.to_string(),
                query: sql.clone(),
                reason,
            }
        })?;

        Ok(sql)
    }
}
