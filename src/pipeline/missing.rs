//! Missing value analysis and null-column elimination

use anyhow::Result;
use polars::prelude::*;

/// Analyze missing values in the dataset.
///
/// Returns `(column, null_ratio)` pairs sorted by ratio descending. Columns
/// with equal ratios keep their table order.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    // Handle empty DataFrame
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let rows = df.height() as f64;

    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / rows))
        .collect();

    // Stable sort so ties keep column order
    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Get features whose missing ratio is strictly above `threshold`.
///
/// Columns listed in `protected` (the label) are never returned. A threshold
/// of `0.0` selects every column holding at least one null.
pub fn get_features_above_threshold(
    missing_ratios: &[(String, f64)],
    threshold: f64,
    protected: &[&str],
) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(name, ratio)| *ratio > threshold && !protected.contains(&name.as_str()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Columns that cannot enter correlation because they are not numeric
pub fn get_non_numeric_features(df: &DataFrame, protected: &[&str]) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| {
            !col.dtype().is_primitive_numeric() && !protected.contains(&col.name().as_str())
        })
        .map(|col| col.name().to_string())
        .collect()
}

/// Drop every column containing a null, plus non-numeric columns.
///
/// Returns the reduced frame and the dropped column names in table order.
/// Running it on its own output drops nothing.
pub fn drop_null_columns(df: &DataFrame, protected: &[&str]) -> Result<(DataFrame, Vec<String>)> {
    let missing_ratios = analyze_missing_values(df)?;
    let with_nulls = get_features_above_threshold(&missing_ratios, 0.0, protected);
    let non_numeric = get_non_numeric_features(df, protected);

    let dropped: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| with_nulls.contains(name) || non_numeric.contains(name))
        .collect();

    Ok((df.drop_many(dropped.iter().map(String::as_str)), dropped))
}
