//! Integration tests for the full load → partition → reduce → train → grade pipeline

use polars::prelude::*;
use repgrade::pipeline::*;
use repgrade::report::{export_run_report, EvaluationSummary, RunFiles, RunMetadata, RunReport};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn scenario_config() -> PipelineConfig {
    PipelineConfig {
        metadata: MetadataPolicy::default(),
        trees: 20,
        ..PipelineConfig::default()
    }
}

#[test]
fn test_full_pipeline_on_scenario() {
    let mut df = create_scenario_dataframe(100, 2024);
    let (_temp_dir, csv_path) = create_temp_csv(&mut df, "pml-training.csv");
    let config = scenario_config();

    let df = load_dataset(&csv_path, &config.load).unwrap();
    assert_eq!(df.shape(), (100, 6));

    let partition = stratified_split(&df, &config.label, config.train_fraction, config.seed).unwrap();
    assert_eq!(partition.train.height(), 80);

    let outcome = FeatureReducer::new(config.reducer())
        .reduce(&partition.train)
        .unwrap();

    // The null column and one of the correlated pair are removed
    assert_eq!(outcome.dropped_null, vec!["sparse"]);
    assert_eq!(outcome.dropped_correlation.len(), 1);
    assert!(["signal", "twin"].contains(&outcome.dropped_correlation[0].as_str()));
    assert!(!outcome.selected.is_empty() && outcome.selected.len() <= 3);

    let model = Trainer::new(&SmartcoreForest, config.trainer())
        .train(&partition.train, &outcome.selected)
        .unwrap();
    let cm = evaluate(&model, &SmartcoreForest, &partition.holdout).unwrap();

    assert_eq!(cm.total(), 20);
    assert!((0.0..=100.0).contains(&cm.accuracy_pct()));
    assert!((cm.error_rate() - (1.0 - cm.accuracy())).abs() < 1e-12);
}

#[test]
fn test_pipeline_grades_test_table() {
    let labeled = create_scenario_dataframe(150, 77);
    let config = scenario_config();

    let temp_dir = TempDir::new().unwrap();
    let mut train_table = labeled.slice(0, 130);
    let mut test_table = unlabeled(&labeled.slice(130, 20), "classe");
    let train_path = write_csv(&mut train_table, &temp_dir, "pml-training.csv");
    let test_path = write_csv(&mut test_table, &temp_dir, "pml-testing.csv");

    let train = load_dataset(&train_path, &config.load).unwrap();
    let test = load_dataset(&test_path, &config.load).unwrap();

    let partition = stratified_split(&train, &config.label, config.train_fraction, config.seed).unwrap();
    let outcome = FeatureReducer::new(config.reducer())
        .reduce(&partition.train)
        .unwrap();
    let model = Trainer::new(&SmartcoreForest, config.trainer())
        .train(&partition.train, &outcome.selected)
        .unwrap();

    check_feature_schema(&test, &model.features).unwrap();
    let predictions = model.predict_frame(&SmartcoreForest, &test).unwrap();
    let mut graded = append_predictions(&test, &config.prediction_column(), &predictions).unwrap();

    let out_path = temp_dir.path().join("pml-testing_predictions.csv");
    save_dataset(&mut graded, &out_path).unwrap();
    let reloaded = load_dataset(&out_path, &config.load).unwrap();

    assert_eq!(reloaded.height(), 20);
    assert_column_exists(&reloaded, "problem_id");
    assert_column_exists(&reloaded, "predicted_classe");
    let ids: Vec<Option<i64>> = reloaded
        .column("problem_id")
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(ids, (1..=20).map(Some).collect::<Vec<_>>(), "Row order must be kept");
}

#[test]
fn test_pipeline_with_metadata_columns() {
    let labeled = with_metadata_columns(&create_scenario_dataframe(100, 5));
    let config = PipelineConfig {
        trees: 20,
        ..PipelineConfig::default()
    };

    let partition = stratified_split(&labeled, &config.label, config.train_fraction, config.seed).unwrap();
    let outcome = FeatureReducer::new(config.reducer())
        .reduce(&partition.train)
        .unwrap();

    assert_eq!(outcome.dropped_metadata.len(), 7);
    for feature in &outcome.selected {
        assert!(["signal", "twin", "parity", "noise"].contains(&feature.as_str()));
    }
}

#[test]
fn test_test_table_missing_feature_is_fatal() {
    let labeled = create_scenario_dataframe(100, 2024);
    let config = scenario_config();
    let model = Trainer::new(&SmartcoreForest, config.trainer())
        .train(&labeled, &["signal".to_string(), "parity".to_string()])
        .unwrap();

    let test = df! {
        "signal" => [1.0f64, 22.0],
        "problem_id" => [1i32, 2],
    }
    .unwrap();

    let err = check_feature_schema(&test, &model.features).unwrap_err();
    assert!(err.to_string().contains("parity"));
    assert!(model.predict_frame(&SmartcoreForest, &test).is_err());
}

#[test]
fn test_run_report_export() {
    let labeled = create_scenario_dataframe(100, 2024);
    let config = scenario_config();
    let partition = stratified_split(&labeled, &config.label, config.train_fraction, config.seed).unwrap();
    let outcome = FeatureReducer::new(config.reducer())
        .reduce(&partition.train)
        .unwrap();
    let model = Trainer::new(&SmartcoreForest, config.trainer())
        .train(&partition.train, &outcome.selected)
        .unwrap();
    let cm = evaluate(&model, &SmartcoreForest, &partition.holdout).unwrap();

    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("pml-training.csv");
    let report_path = temp_dir.path().join("pml-training_report.json");
    let report = RunReport {
        metadata: RunMetadata::new(
            &RunFiles {
                input: &input,
                test: None,
                predictions: None,
                model: None,
            },
            &config,
        ),
        train_stats: dataset_stats(&labeled),
        test_stats: None,
        train_rows: partition.train_rows.len(),
        holdout_rows: partition.holdout_rows.len(),
        reduction: outcome,
        forest: model.params,
        cross_validation: model.cross_validation.clone(),
        evaluation: EvaluationSummary::from_confusion(&cm),
    };
    export_run_report(&report, &report_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["metadata"]["config"]["label"], "classe");
    assert!(json["metadata"].get("test_file").is_none());
    assert_eq!(json["holdout_rows"], 20);
    assert_eq!(json["reduction"]["dropped_null"][0], "sparse");
    assert_eq!(
        json["evaluation"]["confusion_matrix"]["classes"]
            .as_array()
            .unwrap()
            .len(),
        5
    );
    let accuracy = json["evaluation"]["accuracy_pct"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&accuracy));
}
