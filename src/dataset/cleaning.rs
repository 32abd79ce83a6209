//! Data Cleaner - in-place cleaning of an uploaded dataset
//!
//! Every operation replaces the dataset's frame and appends a step to the
//! cleaner's history, so the caller can report what changed.

use super::{ColumnType, Dataset};
use crate::error::{AnalystError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Share of missing values above which `DropColumns` removes a column.
pub const DEFAULT_DROP_THRESHOLD: f64 = 0.5;

const COUNT_COLUMN: &str = "__value_count";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Drop rows with a null in any target column
    DropRows,
    /// Drop target columns whose missing share exceeds `threshold`
    DropColumns { threshold: f64 },
    FillMean,
    FillMedian,
    FillMode,
    /// Fill with a fixed value, cast to each column's type
    FillConstant { value: String },
    ForwardFill,
    BackwardFill,
    /// Linear interpolation over numeric columns
    Interpolate,
}

impl FromStr for MissingStrategy {
    type Err = AnalystError;

    /// Accepts snake or kebab case; a constant fill is written `fill_constant=<value>`.
    fn from_str(s: &str) -> Result<Self> {
        if let Some((name, value)) = s.split_once('=') {
            if name.trim().to_lowercase().replace('-', "_") == "fill_constant" {
                return Ok(MissingStrategy::FillConstant {
                    value: value.to_string(),
                });
            }
        }
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "drop_rows" => Ok(MissingStrategy::DropRows),
            "drop_columns" => Ok(MissingStrategy::DropColumns {
                threshold: DEFAULT_DROP_THRESHOLD,
            }),
            "fill_mean" => Ok(MissingStrategy::FillMean),
            "fill_median" => Ok(MissingStrategy::FillMedian),
            "fill_mode" => Ok(MissingStrategy::FillMode),
            "forward_fill" => Ok(MissingStrategy::ForwardFill),
            "backward_fill" => Ok(MissingStrategy::BackwardFill),
            "interpolate" => Ok(MissingStrategy::Interpolate),
            other => Err(AnalystError::Config(format!("Unknown missing-data strategy: {}", other))),
        }
    }
}

/// Which row of a duplicate group survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepDuplicate {
    First,
    Last,
    /// Drop every row that has a duplicate
    None,
}

impl From<KeepDuplicate> for UniqueKeepStrategy {
    fn from(keep: KeepDuplicate) -> Self {
        match keep {
            KeepDuplicate::First => UniqueKeepStrategy::First,
            KeepDuplicate::Last => UniqueKeepStrategy::Last,
            KeepDuplicate::None => UniqueKeepStrategy::None,
        }
    }
}

/// Rule deciding which numeric values count as outliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Outside `[q1 - multiplier * iqr, q3 + multiplier * iqr]`
    Iqr { multiplier: f64 },
    /// More than `threshold` population standard deviations from the mean
    ZScore { threshold: f64 },
}

impl OutlierMethod {
    pub fn name(&self) -> &'static str {
        match self {
            OutlierMethod::Iqr { .. } => "iqr",
            OutlierMethod::ZScore { .. } => "z_score",
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "iqr" => Ok(OutlierMethod::Iqr { multiplier: 1.5 }),
            "z_score" | "zscore" => Ok(OutlierMethod::ZScore { threshold: 3.0 }),
            other => Err(AnalystError::Config(format!("Unknown outlier method: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningStep {
    pub operation: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub original_shape: (usize, usize),
    pub current_shape: (usize, usize),
    pub rows_removed: usize,
    pub columns_removed: usize,
    pub operations: Vec<CleaningStep>,
}

pub struct DataCleaner<'a> {
    dataset: &'a mut Dataset,
    original_shape: (usize, usize),
    history: Vec<CleaningStep>,
}

impl<'a> DataCleaner<'a> {
    pub fn new(dataset: &'a mut Dataset) -> Self {
        let original_shape = (dataset.height(), dataset.width());
        info!(
            "DataCleaner initialized with {} rows, {} columns",
            original_shape.0, original_shape.1
        );
        Self {
            dataset,
            original_shape,
            history: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &*self.dataset
    }

    pub fn history(&self) -> &[CleaningStep] {
        &self.history
    }

    pub fn summary(&self) -> CleaningSummary {
        let current_shape = (self.dataset.height(), self.dataset.width());
        CleaningSummary {
            original_shape: self.original_shape,
            current_shape,
            rows_removed: self.original_shape.0.saturating_sub(current_shape.0),
            columns_removed: self.original_shape.1.saturating_sub(current_shape.1),
            operations: self.history.clone(),
        }
    }

    /// Apply `strategy` to `columns` (all columns when `None`).
    pub fn handle_missing(&mut self, strategy: MissingStrategy, columns: Option<&[String]>) -> Result<&CleaningStep> {
        let targets = self.target_columns(columns)?;
        let frame = self.dataset.frame().clone();

        let (frame, description) = match &strategy {
            MissingStrategy::DropRows => {
                let frame = frame.drop_nulls(Some(targets.as_slice()))?;
                let description = format!("Dropped rows with missing values in {} columns", targets.len());
                (frame, description)
            }
            MissingStrategy::DropColumns { threshold } => {
                let (height, threshold) = (frame.height(), *threshold);
                let to_drop: Vec<String> = targets
                    .iter()
                    .filter(|name| {
                        height > 0
                            && frame
                                .column(name)
                                .map(|s| s.null_count() as f64 / height as f64 > threshold)
                                .unwrap_or(false)
                    })
                    .cloned()
                    .collect();
                let mut frame = frame;
                for name in &to_drop {
                    frame = frame.drop(name)?;
                }
                let description = format!(
                    "Dropped {} columns with >{}% missing",
                    to_drop.len(),
                    threshold * 100.0
                );
                (frame, description)
            }
            MissingStrategy::FillMean | MissingStrategy::FillMedian => {
                let numeric = numeric_columns(&frame, &targets);
                let exprs: Vec<Expr> = numeric
                    .iter()
                    .map(|name| {
                        let fill = if strategy == MissingStrategy::FillMean {
                            col(name).mean()
                        } else {
                            col(name).median()
                        };
                        col(name).fill_null(fill)
                    })
                    .collect();
                let frame = if exprs.is_empty() {
                    frame
                } else {
                    frame.lazy().with_columns(exprs).collect()?
                };
                let method = if strategy == MissingStrategy::FillMean { "mean" } else { "median" };
                let description = format!("Filled missing values with {} in {} columns", method, numeric.len());
                (frame, description)
            }
            MissingStrategy::FillMode => {
                let mut exprs = Vec::new();
                for name in &targets {
                    let dtype = frame.column(name)?.dtype().clone();
                    match mode_literal(&frame, name)? {
                        Some(value) => exprs.push(col(name).fill_null(value).cast(dtype)),
                        None => debug!("No mode for column {}; left unchanged", name),
                    }
                }
                let filled = exprs.len();
                let frame = if exprs.is_empty() {
                    frame
                } else {
                    frame.lazy().with_columns(exprs).collect()?
                };
                (frame, format!("Filled missing values with mode in {} columns", filled))
            }
            MissingStrategy::FillConstant { value } => {
                let mut exprs = Vec::with_capacity(targets.len());
                for name in &targets {
                    let dtype = frame.column(name)?.dtype().clone();
                    exprs.push(col(name).fill_null(lit(value.clone()).cast(dtype)));
                }
                let frame = if exprs.is_empty() {
                    frame
                } else {
                    frame.lazy().with_columns(exprs).collect()?
                };
                let description = format!(
                    "Filled missing values with constant '{}' in {} columns",
                    value,
                    targets.len()
                );
                (frame, description)
            }
            MissingStrategy::Interpolate => {
                let numeric = numeric_columns(&frame, &targets);
                let exprs: Vec<Expr> = numeric
                    .iter()
                    .map(|name| col(name).interpolate(InterpolationMethod::Linear))
                    .collect();
                let frame = if exprs.is_empty() {
                    frame
                } else {
                    frame.lazy().with_columns(exprs).collect()?
                };
                (frame, format!("Interpolated missing values in {} columns", numeric.len()))
            }
            MissingStrategy::ForwardFill | MissingStrategy::BackwardFill => {
                let (fill, label) = if strategy == MissingStrategy::ForwardFill {
                    (FillNullStrategy::Forward(None), "Forward")
                } else {
                    (FillNullStrategy::Backward(None), "Backward")
                };
                let mut frame = frame;
                for name in &targets {
                    let filled = frame.column(name)?.fill_null(fill)?;
                    frame.with_column(filled)?;
                }
                (frame, format!("{} filled missing values in {} columns", label, targets.len()))
            }
        };

        Ok(self.commit("handle_missing_data", frame, description))
    }

    /// Remove duplicate rows, comparing `subset` columns (all when `None`).
    pub fn remove_duplicates(&mut self, subset: Option<&[String]>, keep: KeepDuplicate) -> Result<&CleaningStep> {
        let subset = match subset {
            Some(columns) => Some(self.target_columns(Some(columns))?),
            None => None,
        };
        let rows_before = self.dataset.height();
        let frame = self
            .dataset
            .frame()
            .clone()
            .lazy()
            .unique_stable(subset, keep.into())
            .collect()?;
        let removed = rows_before - frame.height();
        Ok(self.commit("remove_duplicates", frame, format!("Removed {} duplicate rows", removed)))
    }

    /// Number of outliers in one numeric column. Nulls never count.
    pub fn count_outliers(&self, column: &str, method: OutlierMethod) -> Result<usize> {
        let series = self
            .dataset
            .frame()
            .column(column)
            .map_err(|_| AnalystError::Config(format!("Unknown column: {}", column)))?;
        let Some((lower, upper)) = outlier_bounds(series, method)? else {
            return Ok(0);
        };
        let values = series.cast(&DataType::Float64)?;
        Ok(values
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| *v < lower || *v > upper)
            .count())
    }

    /// Drop rows holding an outlier in any of `columns` (all numeric columns when `None`).
    pub fn remove_outliers(&mut self, method: OutlierMethod, columns: Option<&[String]>) -> Result<&CleaningStep> {
        let targets = match columns {
            Some(columns) => self.target_columns(Some(columns))?,
            None => numeric_columns(self.dataset.frame(), &self.dataset.column_names()),
        };

        let frame = self.dataset.frame();
        let mut mask: Option<Expr> = None;
        for name in &targets {
            let series = frame.column(name)?;
            if ColumnType::from_dtype(series.dtype()) != ColumnType::Numeric {
                debug!("Skipping non-numeric column {} for outlier removal", name);
                continue;
            }
            if let Some((lower, upper)) = outlier_bounds(series, method)? {
                let value = col(name).cast(DataType::Float64);
                let outside = value
                    .clone()
                    .lt(lit(lower))
                    .or(value.gt(lit(upper)))
                    .fill_null(lit(false));
                mask = Some(match mask {
                    Some(mask) => mask.or(outside),
                    None => outside,
                });
            }
        }

        let rows_before = frame.height();
        let frame = match mask {
            Some(mask) => frame.clone().lazy().filter(mask.not()).collect()?,
            None => frame.clone(),
        };
        let description = format!(
            "Removed {} outliers using {} method",
            rows_before - frame.height(),
            method.name()
        );
        Ok(self.commit("remove_outliers", frame, description))
    }

    /// Drop the named columns; names not in the dataset are ignored.
    pub fn drop_columns(&mut self, columns: &[String]) -> Result<&CleaningStep> {
        let mut frame = self.dataset.frame().clone();
        let existing: Vec<&String> = columns
            .iter()
            .filter(|name| frame.column(name).is_ok())
            .collect();
        for name in &existing {
            frame = frame.drop(name)?;
        }
        Ok(self.commit("drop_columns", frame, format!("Dropped {} columns", existing.len())))
    }

    /// Rename columns given as `(old, new)` pairs. All renames apply or none do.
    pub fn rename_columns(&mut self, renames: &[(String, String)]) -> Result<&CleaningStep> {
        let mut frame = self.dataset.frame().clone();
        for (old, new) in renames {
            if new.trim().is_empty() {
                return Err(AnalystError::Config(format!("New name for column {} is empty", old)));
            }
            if frame.column(old).is_err() {
                return Err(AnalystError::Config(format!("Unknown column: {}", old)));
            }
            if old != new && frame.column(new).is_ok() {
                return Err(AnalystError::Config(format!("Column {} already exists", new)));
            }
            frame.rename(old, new)?;
        }
        Ok(self.commit("rename_columns", frame, format!("Renamed {} columns", renames.len())))
    }

    fn target_columns(&self, columns: Option<&[String]>) -> Result<Vec<String>> {
        match columns {
            None => Ok(self.dataset.column_names()),
            Some(columns) => {
                let known = self.dataset.column_names();
                for name in columns {
                    if !known.contains(name) {
                        return Err(AnalystError::Config(format!("Unknown column: {}", name)));
                    }
                }
                Ok(columns.to_vec())
            }
        }
    }

    fn commit(&mut self, operation: &str, frame: DataFrame, description: String) -> &CleaningStep {
        let step = CleaningStep {
            operation: operation.to_string(),
            rows_before: self.dataset.height(),
            rows_after: frame.height(),
            columns_before: self.dataset.width(),
            columns_after: frame.width(),
            description,
        };
        *self.dataset.frame_mut() = frame;

        info!("{}", step.description);
        self.history.push(step);
        &self.history[self.history.len() - 1]
    }
}

fn numeric_columns(frame: &DataFrame, targets: &[String]) -> Vec<String> {
    targets
        .iter()
        .filter(|name| {
            frame
                .column(name)
                .map(|s| ColumnType::from_dtype(s.dtype()) == ColumnType::Numeric)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn outlier_bounds(series: &Series, method: OutlierMethod) -> Result<Option<(f64, f64)>> {
    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?;
    let bounds = match method {
        OutlierMethod::Iqr { multiplier } => {
            let q1 = values.quantile(0.25, QuantileInterpolOptions::Linear)?;
            let q3 = values.quantile(0.75, QuantileInterpolOptions::Linear)?;
            match (q1, q3) {
                (Some(q1), Some(q3)) => {
                    let iqr = q3 - q1;
                    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
                }
                _ => None,
            }
        }
        OutlierMethod::ZScore { threshold } => match (values.mean(), values.std(0)) {
            (Some(mean), Some(std)) if std > 0.0 => Some((mean - threshold * std, mean + threshold * std)),
            _ => None,
        },
    };
    Ok(bounds)
}

/// Most frequent non-null value of a column as a literal; ties go to the first seen.
fn mode_literal(frame: &DataFrame, name: &str) -> Result<Option<Expr>> {
    let counts = frame
        .clone()
        .lazy()
        .filter(col(name).is_not_null())
        .group_by_stable([col(name)])
        .agg([len().alias(COUNT_COLUMN)])
        .collect()?;

    let totals = counts.column(COUNT_COLUMN)?.cast(&DataType::UInt64)?;
    let mut best: Option<(usize, u64)> = None;
    for (idx, count) in totals.u64()?.into_iter().enumerate() {
        if let Some(count) = count {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((idx, count));
            }
        }
    }
    let Some((idx, _)) = best else {
        return Ok(None);
    };

    let values = counts.column(name)?;
    let literal = match ColumnType::from_dtype(values.dtype()) {
        ColumnType::Text => values.str()?.get(idx).map(|v| lit(v.to_string())),
        ColumnType::Boolean => values.bool()?.get(idx).map(lit),
        ColumnType::Numeric => values.cast(&DataType::Float64)?.f64()?.get(idx).map(lit),
        ColumnType::Date | ColumnType::Other => None,
    };
    Ok(literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df![
            "City" => [Some("Pune"), None, Some("Pune"), Some("Delhi"), Some("Pune")],
            "Tenure" => [Some(4i64), Some(10), None, Some(6), Some(4)],
            "Score" => [Some(1.0f64), None, None, Some(3.0), Some(1.0)]
        ]
        .unwrap();
        Dataset::new("sample", df)
    }

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("fill-mean".parse::<MissingStrategy>().unwrap(), MissingStrategy::FillMean);
        assert_eq!(
            "drop_columns".parse::<MissingStrategy>().unwrap(),
            MissingStrategy::DropColumns { threshold: 0.5 }
        );
        assert!("interpolate".parse::<MissingStrategy>().is_err());
    }

    #[test]
    fn test_drop_rows_in_subset() {
        let mut ds = sample();
        let mut cleaner = DataCleaner::new(&mut ds);
        let step = cleaner
            .handle_missing(MissingStrategy::DropRows, Some(&names(&["Tenure"])))
            .unwrap();
        assert_eq!(step.rows_before, 5);
        assert_eq!(step.rows_after, 4);
        assert_eq!(cleaner.summary().rows_removed, 1);
        assert_eq!(ds.height(), 4);
    }

    #[test]
    fn test_drop_columns_over_threshold() {
        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::DropColumns { threshold: 0.3 }, None)
            .unwrap();
        // Score is 40% missing, the others 20%
        assert_eq!(ds.column_names(), vec!["City", "Tenure"]);
    }

    #[test]
    fn test_fill_mean_and_median() {
        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::FillMean, None)
            .unwrap();
        let tenure = ds.frame().column("Tenure").unwrap().cast(&DataType::Float64).unwrap();
        assert_eq!(tenure.f64().unwrap().get(2), Some(6.0));
        // text columns are not numeric and stay untouched
        assert_eq!(ds.frame().column("City").unwrap().null_count(), 1);

        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::FillMedian, Some(&names(&["Score"])))
            .unwrap();
        let score = ds.frame().column("Score").unwrap();
        assert_eq!(score.null_count(), 0);
        assert_eq!(score.f64().unwrap().get(1), Some(1.0));
    }

    #[test]
    fn test_fill_mode_keeps_dtype() {
        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::FillMode, None)
            .unwrap();
        let frame = ds.frame();
        assert_eq!(frame.column("City").unwrap().str().unwrap().get(1), Some("Pune"));
        assert_eq!(frame.column("Tenure").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("Tenure").unwrap().i64().unwrap().get(2), Some(4));
        assert_eq!(frame.column("Score").unwrap().null_count(), 0);
    }

    #[test]
    fn test_forward_and_backward_fill() {
        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::ForwardFill, Some(&names(&["Score"])))
            .unwrap();
        let score = ds.frame().column("Score").unwrap().f64().unwrap().clone();
        assert_eq!(score.get(1), Some(1.0));
        assert_eq!(score.get(2), Some(1.0));

        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::BackwardFill, Some(&names(&["Score"])))
            .unwrap();
        let score = ds.frame().column("Score").unwrap().f64().unwrap().clone();
        assert_eq!(score.get(1), Some(3.0));
    }

    #[test]
    fn test_unknown_target_column() {
        let mut ds = sample();
        let mut cleaner = DataCleaner::new(&mut ds);
        assert!(matches!(
            cleaner.handle_missing(MissingStrategy::DropRows, Some(&names(&["Nope"]))),
            Err(AnalystError::Config(_))
        ));
        assert!(cleaner.history().is_empty());
    }

    #[test]
    fn test_remove_duplicates() {
        let mut ds = sample();
        let mut cleaner = DataCleaner::new(&mut ds);
        let step = cleaner.remove_duplicates(None, KeepDuplicate::First).unwrap();
        // rows 0 and 4 are identical
        assert_eq!(step.rows_after, 4);

        let step = cleaner
            .remove_duplicates(Some(&names(&["City"])), KeepDuplicate::None)
            .unwrap();
        // Pune appears twice and is dropped entirely; null and Delhi remain
        assert_eq!(step.rows_after, 2);
        assert_eq!(cleaner.history().len(), 2);
    }

    #[test]
    fn test_fill_constant_and_interpolate() {
        let mut ds = sample();
        let strategy: MissingStrategy = "fill_constant=0".parse().unwrap();
        DataCleaner::new(&mut ds)
            .handle_missing(strategy, Some(&names(&["Tenure", "Score"])))
            .unwrap();
        assert_eq!(ds.frame().column("Tenure").unwrap().i64().unwrap().get(2), Some(0));
        assert_eq!(ds.frame().column("Score").unwrap().f64().unwrap().get(1), Some(0.0));

        let mut ds = sample();
        DataCleaner::new(&mut ds)
            .handle_missing(MissingStrategy::Interpolate, Some(&names(&["Score"])))
            .unwrap();
        let score = ds.frame().column("Score").unwrap().cast(&DataType::Float64).unwrap();
        let score = score.f64().unwrap();
        // 1.0, _, _, 3.0 interpolates linearly
        assert!((score.get(1).unwrap() - 5.0 / 3.0).abs() < 1e-9);
        assert!((score.get(2).unwrap() - 7.0 / 3.0).abs() < 1e-9);
    }

    fn with_outlier() -> Dataset {
        let df = df![
            "Tenure" => [Some(1i64), Some(2), Some(3), Some(4), Some(100), None],
            "City" => ["a", "b", "c", "d", "e", "f"]
        ]
        .unwrap();
        Dataset::new("outliers", df)
    }

    #[test]
    fn test_remove_outliers_iqr() {
        let mut ds = with_outlier();
        let mut cleaner = DataCleaner::new(&mut ds);
        assert_eq!(cleaner.count_outliers("Tenure", OutlierMethod::Iqr { multiplier: 1.5 }).unwrap(), 1);

        let step = cleaner.remove_outliers("iqr".parse().unwrap(), None).unwrap();
        // the null row is kept
        assert_eq!(step.rows_after, 5);
        assert_eq!(step.description, "Removed 1 outliers using iqr method");
    }

    #[test]
    fn test_remove_outliers_z_score() {
        let mut ds = with_outlier();
        let mut cleaner = DataCleaner::new(&mut ds);
        // five values cannot reach |z| > 3
        cleaner
            .remove_outliers(OutlierMethod::ZScore { threshold: 3.0 }, None)
            .unwrap();
        assert_eq!(cleaner.dataset().height(), 6);

        cleaner
            .remove_outliers(OutlierMethod::ZScore { threshold: 1.5 }, Some(&names(&["Tenure"])))
            .unwrap();
        assert_eq!(cleaner.dataset().height(), 5);
        assert!("isolation_forest".parse::<OutlierMethod>().is_err());
    }

    #[test]
    fn test_drop_and_rename_columns() {
        let mut ds = sample();
        let mut cleaner = DataCleaner::new(&mut ds);
        cleaner.drop_columns(&names(&["Score", "Missing"])).unwrap();
        cleaner
            .rename_columns(&[("Tenure".to_string(), "Months".to_string())])
            .unwrap();
        assert!(cleaner
            .rename_columns(&[("City".to_string(), "Months".to_string())])
            .is_err());

        let summary = cleaner.summary();
        assert_eq!(summary.columns_removed, 1);
        assert_eq!(summary.operations.len(), 2);
        assert_eq!(ds.column_names(), vec!["City", "Months"]);
    }
}
