//! Query Result - tabular output of one executed query

use crate::error::{AnalystError, Result};
use polars::prelude::*;
use serde::Serialize;

/// Result of executing a synthesized query against a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Result rows; not serialized directly, see `to_json`
    #[serde(skip)]
    pub data: DataFrame,

    /// Column names in result order
    pub columns: Vec<String>,

    /// Number of rows returned
    pub row_count: usize,

    /// Wall-clock execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    pub fn new(data: DataFrame, execution_time_ms: u64) -> Self {
        let columns: Vec<String> = data.get_column_names().iter().map(|s| s.to_string()).collect();
        let row_count = data.height();
        Self {
            data,
            columns,
            row_count,
            execution_time_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// First `max_rows` rows.
    pub fn head(&self, max_rows: usize) -> DataFrame {
        self.data.head(Some(max_rows))
    }

    /// Plain-text rendering of at most `max_rows` rows, one row per line.
    pub fn preview(&self, max_rows: usize) -> Result<String> {
        let head = self.head(max_rows);
        let mut lines = vec![self.columns.join(" | ")];
        for row_idx in 0..head.height() {
            let cells: Vec<String> = head
                .get_columns()
                .iter()
                .map(|series| cell_text(series, row_idx))
                .collect::<Result<_>>()?;
            lines.push(cells.join(" | "));
        }
        Ok(lines.join("\n"))
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        dataframe_to_json(&self.data)
    }
}

/// Convert DataFrame to JSON value
pub fn dataframe_to_json(df: &DataFrame) -> Result<serde_json::Value> {
    let mut rows = Vec::with_capacity(df.height());

    for row_idx in 0..df.height() {
        let mut row = serde_json::Map::new();
        for series in df.get_columns() {
            row.insert(series.name().to_string(), series_to_json_value(series, row_idx)?);
        }
        rows.push(serde_json::Value::Object(row));
    }

    Ok(serde_json::Value::Array(rows))
}

fn cell_text(series: &Series, row_idx: usize) -> Result<String> {
    let value = series
        .get(row_idx)
        .map_err(|e| AnalystError::Polars(format!("Failed to get value: {}", e)))?;
    Ok(match value {
        AnyValue::Null => "null".to_string(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    })
}

fn series_to_json_value(series: &Series, row_idx: usize) -> Result<serde_json::Value> {
    let any_val = series
        .get(row_idx)
        .map_err(|e| AnalystError::Polars(format!("Failed to get value: {}", e)))?;

    match any_val {
        AnyValue::Null => Ok(serde_json::Value::Null),
        AnyValue::Boolean(b) => Ok(serde_json::Value::Bool(b)),
        AnyValue::String(s) => Ok(serde_json::Value::String(s.to_string())),
        AnyValue::Int8(i) => Ok(serde_json::Value::Number(i.into())),
        AnyValue::Int16(i) => Ok(serde_json::Value::Number(i.into())),
        AnyValue::Int32(i) => Ok(serde_json::Value::Number(i.into())),
        AnyValue::Int64(i) => Ok(serde_json::Value::Number(i.into())),
        AnyValue::UInt8(u) => Ok(serde_json::Value::Number(u.into())),
        AnyValue::UInt16(u) => Ok(serde_json::Value::Number(u.into())),
        AnyValue::UInt32(u) => Ok(serde_json::Value::Number(u.into())),
        AnyValue::UInt64(u) => Ok(serde_json::Value::Number(u.into())),
        AnyValue::Float32(f) => Ok(serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)),
        AnyValue::Float64(f) => Ok(serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)),
        other => Ok(serde_json::Value::String(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> QueryResult {
        let df = df![
            "Device" => [Some("Phone"), Some("Computer"), None],
            "count" => [12u32, 7, 1]
        ]
        .unwrap();
        QueryResult::new(df, 3)
    }

    #[test]
    fn test_shape() {
        let r = result();
        assert_eq!(r.columns, vec!["Device", "count"]);
        assert_eq!(r.row_count, 3);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_to_json() {
        let json = result().to_json().unwrap();
        assert_eq!(json[0]["Device"], "Phone");
        assert_eq!(json[1]["count"], 7);
        assert!(json[2]["Device"].is_null());
    }

    #[test]
    fn test_preview_truncates() {
        let text = result().preview(2).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Device | count");
        assert_eq!(lines[1], "Phone | 12");
    }
}
