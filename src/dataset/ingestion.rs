//! Dataset ingestion: CSV loading, column-name cleaning and best-effort
//! type inference.

use super::Dataset;
use crate::error::{AnalystError, Result};
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Cell values read as missing.
pub const NULL_MARKERS: [&str; 3] = ["NA", "N/A", "missing"];

lazy_static! {
    static ref NON_IDENTIFIER: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
}

/// Load a CSV file, clean its column names and infer column types.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let null_values = NullValues::AllColumns(NULL_MARKERS.iter().map(|s| s.to_string()).collect());

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_null_values(Some(null_values))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| AnalystError::Ingestion(format!("Error processing file {}: {}", path.display(), e)))?;

    if df.width() == 0 || df.height() == 0 {
        return Err(AnalystError::Ingestion(format!(
            "Uploaded file {} has no data or no valid columns",
            path.display()
        )));
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();

    let df = prepare_frame(df)?;
    info!("Data preprocessed: {} rows, {} columns", df.height(), df.width());
    Ok(Dataset::new(name, df))
}

/// Write a dataset to CSV with a header row.
pub fn write_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;
    let mut frame = dataset.frame().clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut frame)?;
    info!("Wrote {} rows to {}", frame.height(), path.display());
    Ok(())
}

/// Clean column names and infer types on an already-loaded frame.
pub fn prepare_frame(mut df: DataFrame) -> Result<DataFrame> {
    let cleaned = clean_column_names(&df.get_column_names().iter().map(|s| s.to_string()).collect::<Vec<_>>());
    df.set_column_names(cleaned.as_slice())?;
    infer_types(df)
}

/// Trim, turn spaces into underscores and drop anything that is not `[A-Za-z0-9_]`.
pub fn clean_column_name(raw: &str) -> String {
    let underscored = raw.trim().replace(' ', "_");
    NON_IDENTIFIER.replace_all(&underscored, "").into_owned()
}

/// Clean every name, filling blanks and de-duplicating with numeric suffixes.
pub fn clean_column_names(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.iter()
        .enumerate()
        .map(|(i, name)| {
            let mut cleaned = clean_column_name(name);
            if cleaned.is_empty() {
                cleaned = format!("column_{}", i);
            }
            let base = cleaned.clone();
            let mut suffix = 1;
            while seen.contains(&cleaned) {
                cleaned = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            seen.insert(cleaned.clone());
            cleaned
        })
        .collect()
}

/// Parse date-named text columns as dates and coerce numeric-looking text to numbers.
pub fn infer_types(mut df: DataFrame) -> Result<DataFrame> {
    let text_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|s| s.dtype() == &DataType::String)
        .map(|s| s.name().to_string())
        .collect();

    for name in text_columns {
        if name.to_lowercase().contains("date") {
            df = parse_date_column(df, &name)?;
            if df.column(&name)?.dtype() != &DataType::String {
                continue;
            }
        }

        let series = df.column(&name)?;
        if let Ok(numeric) = series.strict_cast(&DataType::Float64) {
            debug!("Coerced column {} to numeric", name);
            df.with_column(numeric)?;
        }
    }

    Ok(df)
}

fn parse_date_column(df: DataFrame, name: &str) -> Result<DataFrame> {
    let non_null_before = {
        let series = df.column(name)?;
        series.len() - series.null_count()
    };

    let options = StrptimeOptions {
        strict: false,
        ..Default::default()
    };
    let parsed = df
        .clone()
        .lazy()
        .with_column(col(name).str().to_date(options))
        .collect();

    match parsed {
        Ok(parsed) => {
            let series = parsed.column(name)?;
            let non_null_after = series.len() - series.null_count();
            if non_null_before > 0 && non_null_after == 0 {
                warn!("Column {} looks like a date but no value parsed; left as text", name);
                return Ok(df);
            }
            if non_null_after < non_null_before {
                warn!(
                    "Column {}: {} values could not be parsed as dates",
                    name,
                    non_null_before - non_null_after
                );
            }
            Ok(parsed)
        }
        Err(e) => {
            warn!("Column {} looks like a date but could not be parsed: {}", name, e);
            Ok(df)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnType;

    #[test]
    fn test_clean_column_name() {
        assert_eq!(clean_column_name("  Preferred Login Device "), "Preferred_Login_Device");
        assert_eq!(clean_column_name("Order-Count (#)"), "OrderCount_");
        assert_eq!(clean_column_name("Tenure"), "Tenure");
    }

    #[test]
    fn test_clean_column_names_dedupes_and_fills() {
        let raw: Vec<String> = ["a b", "a_b", "%%", "a b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(clean_column_names(&raw), vec!["a_b", "a_b_1", "column_2", "a_b_2"]);
    }

    #[test]
    fn test_numeric_text_is_coerced() {
        let df = df![
            "Amount" => ["1.5", "2", "3.25"],
            "Label" => ["x", "2", "3"]
        ]
        .unwrap();
        let ds = Dataset::new("t", infer_types(df).unwrap());
        assert_eq!(ds.column_type("Amount"), Some(ColumnType::Numeric));
        assert_eq!(ds.column_type("Label"), Some(ColumnType::Text));
    }

    #[test]
    fn test_date_named_column_is_parsed() {
        let df = df![
            "signup_date" => ["2024-01-15", "2024-02-20", "2024-03-01"],
            "Notes" => ["a", "b", "c"]
        ]
        .unwrap();
        let ds = Dataset::new("t", infer_types(df).unwrap());
        assert_eq!(ds.column_type("signup_date"), Some(ColumnType::Date));
        assert_eq!(ds.column_type("Notes"), Some(ColumnType::Text));
    }

    #[test]
    fn test_date_like_name_still_gets_numeric_coercion() {
        let df = df![
            "Mandate_Count" => ["1", "2", "3"],
            "Candidate" => ["Ann", "Bo", "Cy"]
        ]
        .unwrap();
        let ds = Dataset::new("t", infer_types(df).unwrap());
        assert_eq!(ds.column_type("Mandate_Count"), Some(ColumnType::Numeric));
        assert_eq!(ds.column_type("Candidate"), Some(ColumnType::Text));
    }

    #[test]
    fn test_unparseable_date_column_is_left_alone() {
        let df = df!["UpdateDate" => ["soon", "later"]].unwrap();
        let ds = Dataset::new("t", infer_types(df).unwrap());
        assert_eq!(ds.column_type("UpdateDate"), Some(ColumnType::Text));
    }

    #[test]
    fn test_written_csv_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        let df = df![
            "Device" => ["Phone", "Computer"],
            "Tenure" => [Some(4i64), None]
        ]
        .unwrap();
        write_csv(&Dataset::new("cleaned", df), &path).unwrap();

        let ds = load_csv(&path).unwrap();
        assert_eq!(ds.name(), "cleaned");
        assert_eq!(ds.column_names(), vec!["Device", "Tenure"]);
        assert_eq!(ds.column_type("Tenure"), Some(ColumnType::Numeric));
        assert_eq!(ds.frame().column("Tenure").unwrap().null_count(), 1);
    }
}
