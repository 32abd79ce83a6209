//! In-memory tabular dataset.
//!
//! A `Dataset` is created from an uploaded file (see `ingestion`), may be
//! mutated in place by cleaning steps, and is discarded with the session.

pub mod cleaning;
pub mod ingestion;
pub mod profile;
pub mod statistics;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Semantic type of a column as seen by the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
    Date,
    Boolean,
    Other,
}

impl ColumnType {
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => ColumnType::Text,
            DataType::Boolean => ColumnType::Boolean,
            DataType::Date | DataType::Datetime(_, _) => ColumnType::Date,
            d if d.is_numeric() => ColumnType::Numeric,
            _ => ColumnType::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    frame: DataFrame,
}

impl Dataset {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Mutable access for in-place cleaning and feature steps.
    pub fn frame_mut(&mut self) -> &mut DataFrame {
        &mut self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn column_types(&self) -> Vec<(String, ColumnType)> {
        self.frame
            .get_columns()
            .iter()
            .map(|s| (s.name().to_string(), ColumnType::from_dtype(s.dtype())))
            .collect()
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.frame
            .column(column)
            .ok()
            .map(|s| ColumnType::from_dtype(s.dtype()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_types() {
        let df = df![
            "Device" => ["Phone", "Computer"],
            "Tenure" => [4i64, 9],
            "Score" => [1.5f64, 2.5],
            "Active" => [true, false]
        ]
        .unwrap();
        let ds = Dataset::new("customers", df);

        assert_eq!(ds.column_names(), vec!["Device", "Tenure", "Score", "Active"]);
        assert_eq!(ds.column_type("Device"), Some(ColumnType::Text));
        assert_eq!(ds.column_type("Tenure"), Some(ColumnType::Numeric));
        assert_eq!(ds.column_type("Score"), Some(ColumnType::Numeric));
        assert_eq!(ds.column_type("Active"), Some(ColumnType::Boolean));
        assert_eq!(ds.column_type("Missing"), None);
        assert_eq!((ds.height(), ds.width()), (2, 4));
    }
}
