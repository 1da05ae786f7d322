//! Dataset loader for CSV and Parquet files

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;

use super::error::PipelineError;

/// Tokens that the sensor exports use for "no value".
///
/// Spreadsheet exports of the recordings write `#DIV/0!` for summary
/// statistics computed over a single sample.
pub const DEFAULT_NULL_TOKENS: [&str; 3] = ["", "NA", "#DIV/0!"];

/// Options controlling how delimited files are parsed
#[derive(Debug, Clone, Serialize)]
pub struct LoadOptions {
    /// Strings normalized to null in every column
    pub null_tokens: Vec<String>,
    /// Rows used for schema inference; 0 scans the whole file
    pub infer_schema_length: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|s| s.to_string()).collect(),
            infer_schema_length: 10000,
        }
    }
}

impl LoadOptions {
    /// Add extra null tokens on top of the defaults, skipping duplicates
    pub fn with_extra_null_tokens(mut self, extra: &[String]) -> Self {
        for token in extra {
            if !self.null_tokens.contains(token) {
                self.null_tokens.push(token.clone());
            }
        }
        self
    }
}

/// Basic shape information about a loaded table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Reject a CSV file whose records do not all match the header's field count.
///
/// Polars pads short rows with nulls, which would later surface as a
/// dropped feature or a null label far from the real cause.
pub fn check_rectangular(path: &Path) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut record = csv::ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                if let csv::ErrorKind::UnequalLengths {
                    pos,
                    expected_len,
                    len,
                } = err.kind()
                {
                    let line = pos.as_ref().map(|p| p.line()).unwrap_or(0);
                    return Err(anyhow::Error::new(PipelineError::RaggedRow {
                        line,
                        expected: *expected_len,
                        found: *len,
                    })
                    .context(format!("Malformed CSV file: {}", path.display())));
                }
                return Err(anyhow::Error::new(err)
                    .context(format!("Failed to read CSV file: {}", path.display())));
            }
        }
    }

    Ok(())
}

/// Load a dataset from a file (CSV or Parquet based on extension).
///
/// CSV null tokens are normalized to polars nulls at parse time, so
/// downstream stages only ever see one missing-value representation.
/// A file that cannot be parsed into a rectangular table is an error.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    let extension = file_extension(path);

    let lf = match extension.as_str() {
        "csv" => {
            let schema_length = if options.infer_schema_length == 0 {
                None
            } else {
                Some(options.infer_schema_length)
            };
            let tokens: Vec<PlSmallStr> = options
                .null_tokens
                .iter()
                .map(|t| PlSmallStr::from(t.as_str()))
                .collect();

            check_rectangular(path)?;

            LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(schema_length)
                .with_null_values(Some(NullValues::AllColumns(tokens)))
                .finish()
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    let df = lf
        .collect()
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

    Ok(df)
}

/// Read only the column names of a dataset
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let extension = file_extension(path);

    let mut lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .with_context(|| format!("Failed to read CSV header: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to read Parquet schema: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    let schema = lf.collect_schema()?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Shape and estimated memory footprint of a loaded table
pub fn dataset_stats(df: &DataFrame) -> DatasetStats {
    let (rows, columns) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);

    DatasetStats {
        rows,
        columns,
        memory_mb,
    }
}

/// Write a table to CSV or Parquet based on the output extension
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = file_extension(path);

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}
