//! Dataset profiling and data-quality scoring.

use super::{ColumnType, Dataset};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub text_columns: usize,
    pub date_columns: usize,
    pub missing_values: BTreeMap<String, usize>,
    pub column_types: BTreeMap<String, ColumnType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub non_null: usize,
    pub null_count: usize,
    pub null_pct: f64,
    pub unique: usize,
    pub unique_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub quality_score: f64,
    pub completeness: f64,
    pub uniqueness: f64,
    pub missing_cells: usize,
    pub duplicate_rows: usize,
    pub total_cells: usize,
}

pub fn profile(dataset: &Dataset) -> DataProfile {
    let column_types: BTreeMap<String, ColumnType> = dataset.column_types().into_iter().collect();
    let count = |t: ColumnType| column_types.values().filter(|c| **c == t).count();

    DataProfile {
        total_rows: dataset.height(),
        total_columns: dataset.width(),
        numeric_columns: count(ColumnType::Numeric),
        text_columns: count(ColumnType::Text),
        date_columns: count(ColumnType::Date),
        missing_values: dataset
            .frame()
            .get_columns()
            .iter()
            .map(|s| (s.name().to_string(), s.null_count()))
            .collect(),
        column_types,
    }
}

pub fn column_summaries(dataset: &Dataset) -> Result<Vec<ColumnSummary>> {
    let rows = dataset.height();
    dataset
        .frame()
        .get_columns()
        .iter()
        .map(|s| -> Result<ColumnSummary> {
            let null_count = s.null_count();
            let unique = s.n_unique()?;
            Ok(ColumnSummary {
                name: s.name().to_string(),
                column_type: ColumnType::from_dtype(s.dtype()),
                non_null: s.len() - null_count,
                null_count,
                null_pct: percentage(null_count, rows),
                unique,
                unique_pct: percentage(unique, rows),
            })
        })
        .collect()
}

/// Weighted score: 60% completeness, 40% row uniqueness.
pub fn quality_score(dataset: &Dataset) -> Result<QualityScore> {
    let df = dataset.frame();
    let total_cells = df.height() * df.width();
    let missing_cells: usize = df.get_columns().iter().map(|s| s.null_count()).sum();

    let distinct_rows = if df.height() == 0 {
        0
    } else {
        df.clone()
            .lazy()
            .unique(None, UniqueKeepStrategy::Any)
            .collect()?
            .height()
    };
    let duplicate_rows = df.height() - distinct_rows;

    let completeness = if total_cells == 0 {
        100.0
    } else {
        100.0 - percentage(missing_cells, total_cells)
    };
    let uniqueness = if df.height() == 0 {
        100.0
    } else {
        100.0 - percentage(duplicate_rows, df.height())
    };

    Ok(QualityScore {
        quality_score: round2(completeness * 0.6 + uniqueness * 0.4),
        completeness: round2(completeness),
        uniqueness: round2(uniqueness),
        missing_cells,
        duplicate_rows,
        total_cells,
    })
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
