//! Descriptive statistics and pairwise correlations.

use super::{ColumnType, Dataset};
use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// How many most-frequent values a categorical summary keeps.
pub const TOP_VALUES: usize = 5;

const COUNT_COLUMN: &str = "__value_count";
const CORRELATION_COLUMN: &str = "__correlation";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStatistics {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalStatistics {
    pub name: String,
    pub unique_values: usize,
    pub top_values: Vec<ValueCount>,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub numeric: Vec<NumericStatistics>,
    pub categorical: Vec<CategoricalStatistics>,
    pub missing_values: BTreeMap<String, usize>,
    pub data_types: BTreeMap<String, String>,
    /// Distinct non-null values per column
    pub unique_counts: BTreeMap<String, usize>,
}

/// Square Pearson matrix over the numeric columns.
///
/// `None` marks a pair with too few complete rows, a constant column, or a
/// coefficient filtered out by the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }

    /// Off-diagonal pairs with `|r| >= threshold`, strongest first.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for (i, a) in self.columns.iter().enumerate() {
            for (j, b) in self.columns.iter().enumerate().skip(i + 1) {
                if let Some(r) = self.values[i][j] {
                    if r.abs() >= threshold {
                        pairs.push((a.clone(), b.clone(), r));
                    }
                }
            }
        }
        pairs.sort_by(|x, y| y.2.abs().total_cmp(&x.2.abs()));
        pairs
    }
}

pub fn summary_statistics(dataset: &Dataset) -> Result<SummaryStatistics> {
    let frame = dataset.frame();
    let mut summary = SummaryStatistics {
        numeric: Vec::new(),
        categorical: Vec::new(),
        missing_values: BTreeMap::new(),
        data_types: BTreeMap::new(),
        unique_counts: BTreeMap::new(),
    };

    for series in frame.get_columns() {
        let name = series.name().to_string();
        let unique = series.drop_nulls().n_unique()?;
        summary.missing_values.insert(name.clone(), series.null_count());
        summary.data_types.insert(name.clone(), series.dtype().to_string());
        summary.unique_counts.insert(name.clone(), unique);

        match ColumnType::from_dtype(series.dtype()) {
            ColumnType::Numeric => summary.numeric.push(numeric_statistics(series)?),
            ColumnType::Text => summary.categorical.push(CategoricalStatistics {
                top_values: top_values(frame, &name, TOP_VALUES)?,
                unique_values: unique,
                missing: series.null_count(),
                name,
            }),
            _ => {}
        }
    }

    info!("Generated summary statistics for {} columns", frame.width());
    Ok(summary)
}

fn numeric_statistics(series: &Series) -> Result<NumericStatistics> {
    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?;
    Ok(NumericStatistics {
        name: series.name().to_string(),
        count: values.len() - values.null_count(),
        mean: values.mean(),
        std: values.std(1),
        min: values.min(),
        q25: values.quantile(0.25, QuantileInterpolOptions::Linear)?,
        median: values.median(),
        q75: values.quantile(0.75, QuantileInterpolOptions::Linear)?,
        max: values.max(),
    })
}

/// Most frequent non-null values of a column, ties in order of first appearance.
pub fn top_values(frame: &DataFrame, column: &str, limit: usize) -> Result<Vec<ValueCount>> {
    let counts = frame
        .clone()
        .lazy()
        .filter(col(column).is_not_null())
        .group_by_stable([col(column)])
        .agg([len().alias(COUNT_COLUMN)])
        .collect()?;

    let values = counts.column(column)?.cast(&DataType::String)?;
    let totals = counts.column(COUNT_COLUMN)?.cast(&DataType::UInt64)?;

    let mut pairs: Vec<ValueCount> = values
        .str()?
        .into_iter()
        .zip(totals.u64()?.into_iter())
        .filter_map(|(value, count)| {
            Some(ValueCount {
                value: value?.to_string(),
                count: count? as usize,
            })
        })
        .collect();
    pairs.sort_by(|a, b| b.count.cmp(&a.count));
    pairs.truncate(limit);
    Ok(pairs)
}

/// Pearson correlations between every pair of numeric columns, using the
/// rows where both values are present. Coefficients below `min_threshold`
/// in absolute value are cleared when the threshold is positive.
pub fn correlations(dataset: &Dataset, min_threshold: f64) -> Result<CorrelationMatrix> {
    let frame = dataset.frame();
    let columns: Vec<String> = dataset
        .column_types()
        .into_iter()
        .filter(|(_, t)| *t == ColumnType::Numeric)
        .map(|(name, _)| name)
        .collect();

    if columns.len() < 2 {
        return Ok(CorrelationMatrix {
            columns: Vec::new(),
            values: Vec::new(),
        });
    }

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        let column = frame.column(&columns[i])?.cast(&DataType::Float64)?;
        values[i][i] = column.f64()?.std(1).filter(|s| *s > 0.0).map(|_| 1.0);
        for j in (i + 1)..n {
            let r = pearson(frame, &columns[i], &columns[j])?;
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    if min_threshold > 0.0 {
        for row in values.iter_mut() {
            for cell in row.iter_mut() {
                if cell.map_or(false, |r: f64| r.abs() < min_threshold) {
                    *cell = None;
                }
            }
        }
    }

    info!("Calculated pearson correlations over {} columns", n);
    Ok(CorrelationMatrix { columns, values })
}

fn pearson(frame: &DataFrame, a: &str, b: &str) -> Result<Option<f64>> {
    let out = frame
        .clone()
        .lazy()
        .select([col(a).cast(DataType::Float64), col(b).cast(DataType::Float64)])
        .filter(col(a).is_not_null().and(col(b).is_not_null()))
        .select([pearson_corr(col(a), col(b), 1).alias(CORRELATION_COLUMN)])
        .collect()?;

    let r = out.column(CORRELATION_COLUMN)?.cast(&DataType::Float64)?;
    Ok(r.f64()?.get(0).filter(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df![
            "Device" => [Some("Phone"), Some("Computer"), Some("Phone"), None, Some("Phone")],
            "Tenure" => [Some(1i64), Some(2), Some(3), Some(4), Some(5)],
            "Orders" => [Some(2.0f64), Some(4.0), Some(6.0), Some(8.0), None],
            "Refunds" => [5i64, 4, 3, 2, 1],
            "Region" => [7i64, 7, 7, 7, 7]
        ]
        .unwrap();
        Dataset::new("sample", df)
    }

    #[test]
    fn test_numeric_statistics() {
        let stats = summary_statistics(&sample()).unwrap();
        let tenure = stats.numeric.iter().find(|s| s.name == "Tenure").unwrap();
        assert_eq!(tenure.count, 5);
        assert_eq!(tenure.mean, Some(3.0));
        assert_eq!(tenure.min, Some(1.0));
        assert_eq!(tenure.q25, Some(2.0));
        assert_eq!(tenure.median, Some(3.0));
        assert_eq!(tenure.q75, Some(4.0));
        assert_eq!(tenure.max, Some(5.0));
        assert!((tenure.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-9);

        let orders = stats.numeric.iter().find(|s| s.name == "Orders").unwrap();
        assert_eq!(orders.count, 4);
        assert_eq!(orders.mean, Some(5.0));
    }

    #[test]
    fn test_categorical_statistics() {
        let stats = summary_statistics(&sample()).unwrap();
        assert_eq!(stats.categorical.len(), 1);

        let device = &stats.categorical[0];
        assert_eq!(device.name, "Device");
        assert_eq!(device.unique_values, 2);
        assert_eq!(device.missing, 1);
        assert_eq!(
            device.top_values,
            vec![
                ValueCount { value: "Phone".to_string(), count: 3 },
                ValueCount { value: "Computer".to_string(), count: 1 },
            ]
        );
        assert_eq!(stats.missing_values["Orders"], 1);
        assert_eq!(stats.unique_counts["Region"], 1);
    }

    #[test]
    fn test_correlations_pairwise_complete() {
        let matrix = correlations(&sample(), 0.0).unwrap();
        assert_eq!(matrix.columns, vec!["Tenure", "Orders", "Refunds", "Region"]);

        // Orders is 2 * Tenure on the rows where both are present
        assert!((matrix.get("Tenure", "Orders").unwrap() - 1.0).abs() < 1e-9);
        assert!((matrix.get("Refunds", "Tenure").unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(matrix.get("Tenure", "Tenure"), Some(1.0));
        // a constant column has no defined correlation
        assert_eq!(matrix.get("Region", "Tenure"), None);
        assert_eq!(matrix.get("Region", "Region"), None);

        let strong = matrix.strong_pairs(0.9);
        assert_eq!(strong.len(), 3);
        assert!(strong.iter().all(|(_, _, r)| r.abs() > 0.99));
    }

    #[test]
    fn test_correlation_threshold_and_too_few_columns() {
        let df = df![
            "x" => [1.0f64, 2.0, 3.0, 4.0],
            "y" => [1.0f64, 3.0, 2.0, 4.0],
            "z" => [4.0f64, 3.0, 2.0, 1.0]
        ]
        .unwrap();
        let matrix = correlations(&Dataset::new("t", df), 0.9).unwrap();
        // corr(x, y) = 0.8
        assert_eq!(matrix.get("x", "y"), None);
        assert!((matrix.get("x", "z").unwrap() + 1.0).abs() < 1e-9);

        let single = Dataset::new("t", df!["x" => [1i64, 2], "label" => ["a", "b"]].unwrap());
        assert!(correlations(&single, 0.0).unwrap().is_empty());
    }
}
