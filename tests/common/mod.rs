//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

pub const CLASSES: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Create the five-feature scenario table with known characteristics
///
/// This DataFrame includes `rows` rows cycling through the five classes:
/// - `signal`: Separates the classes (class index * 10 plus noise)
/// - `twin`: `signal` plus wider noise (correlation ~0.95 with signal)
/// - `sparse`: Informative but null in 10% of rows (should be dropped)
/// - `parity`: Tracks class parity, uncorrelated with signal
/// - `noise`: Pure noise
/// - `classe`: Five-level label A-E
pub fn create_scenario_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let classes: Vec<usize> = (0..rows).map(|i| i % CLASSES.len()).collect();
    let signal: Vec<f64> = classes
        .iter()
        .map(|&c| c as f64 * 10.0 + rng.gen::<f64>() * 4.0)
        .collect();
    let twin: Vec<f64> = signal
        .iter()
        .map(|s| s + rng.gen::<f64>() * 16.0)
        .collect();
    let sparse: Vec<Option<f64>> = classes
        .iter()
        .enumerate()
        .map(|(i, &c)| if i % 10 == 3 { None } else { Some(c as f64) })
        .collect();
    let parity: Vec<f64> = classes
        .iter()
        .map(|&c| (c % 2) as f64 * 5.0 + rng.gen::<f64>())
        .collect();
    let noise: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>() * 100.0).collect();
    let labels: Vec<&str> = classes.iter().map(|&c| CLASSES[c]).collect();

    df! {
        "signal" => signal,
        "twin" => twin,
        "sparse" => sparse,
        "parity" => parity,
        "noise" => noise,
        "classe" => labels,
    }
    .unwrap()
}

/// Prepend the seven metadata columns a sensor export carries
pub fn with_metadata_columns(df: &DataFrame) -> DataFrame {
    let rows = df.height();
    let index: Vec<i32> = (1..=rows as i32).collect();
    let users: Vec<&str> = (0..rows)
        .map(|i| ["adelmo", "carlitos", "pedro"][i % 3])
        .collect();
    let part1: Vec<i64> = (0..rows as i64).map(|i| 1_323_084_231 + i).collect();
    let part2: Vec<i64> = (0..rows as i64).map(|i| 788_290 + i * 1000).collect();
    let stamps: Vec<&str> = vec!["05/12/2011 11:23"; rows];
    let windows: Vec<&str> = (0..rows)
        .map(|i| if i % 20 == 0 { "yes" } else { "no" })
        .collect();
    let window_ids: Vec<i32> = (0..rows as i32).map(|i| i / 20 + 1).collect();

    let mut meta = df! {
        "X" => index,
        "user_name" => users,
        "raw_timestamp_part_1" => part1,
        "raw_timestamp_part_2" => part2,
        "cvtd_timestamp" => stamps,
        "new_window" => windows,
        "num_window" => window_ids,
    }
    .unwrap();
    meta.hstack_mut(df.get_columns()).unwrap();
    meta
}

/// Unlabeled copy of a table with a trailing `problem_id` column
pub fn unlabeled(df: &DataFrame, label: &str) -> DataFrame {
    let mut test = df.drop(label).unwrap();
    let ids: Vec<i32> = (1..=test.height() as i32).collect();
    test.with_column(Column::new("problem_id".into(), ids))
        .unwrap();
    test
}

/// Create a DataFrame with specific missing value patterns
pub fn create_missing_test_dataframe() -> DataFrame {
    df! {
        "col_complete" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        "col_20pct_missing" => [Some(1.0f64), None, Some(3.0), Some(4.0), Some(5.0)], // 20% missing
        "col_40pct_missing" => [Some(1.0f64), Some(2.0), None, None, Some(5.0)], // 40% missing
        "col_all_missing" => [None::<f64>, None, None, None, None], // 100% missing
        "classe" => ["A", "B", "A", "B", "A"],
    }
    .unwrap()
}

/// Create a DataFrame with known correlation patterns
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "classe" => ["A", "B", "A", "B", "A", "B", "A", "B", "A", "B"],
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0], // Perfectly correlated with a (b = 2*a)
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], // Negatively correlated with a
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0], // Weakly related to a
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame, name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join(name);

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Write a CSV file into an existing directory
pub fn write_csv(df: &mut DataFrame, dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame, name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join(name);

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Write raw text to a file in a fresh temp directory
pub fn create_temp_text(contents: &str, name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

/// Get column names as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Assert that a column exists in the DataFrame
pub fn assert_column_exists(df: &DataFrame, col_name: &str) {
    assert!(
        df.column(col_name).is_ok(),
        "Column '{}' should exist in DataFrame",
        col_name
    );
}

/// Assert that a column does not exist in the DataFrame
pub fn assert_column_not_exists(df: &DataFrame, col_name: &str) {
    assert!(
        df.column(col_name).is_err(),
        "Column '{}' should not exist in DataFrame",
        col_name
    );
}
