//! Rep-grade: exercise repetition grading CLI
//!
//! Selects informative sensor features from a labeled training table,
//! fits a random forest, reports holdout accuracy and grades an
//! unlabeled table.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use repgrade::cli::{run_predict, Cli, Commands};
use repgrade::pipeline::{
    append_predictions, check_feature_schema, dataset_stats, evaluate, label_distribution,
    load_dataset, save_dataset, save_model, stratified_split, FeatureReducer, SmartcoreForest,
    Trainer,
};
use repgrade::report::{
    display_confusion_matrix, display_cross_validation, export_run_report, EvaluationSummary,
    ReductionSummary, RunFiles, RunMetadata, RunReport,
};
use repgrade::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    ConfigCard,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Predict {
                model,
                input,
                output,
                infer_schema_length,
                null_token,
            } => run_predict(
                model,
                input,
                output.as_deref(),
                *infer_schema_length,
                null_token,
            )
            .map(|_| ()),
        };
    }

    // Main training pipeline - require input
    let input = cli.input().cloned().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;
    let test = cli.test.clone();
    let predictions_path = cli.output_path();
    let model_path: PathBuf = cli
        .model_path()
        .context("Could not derive a model path from the input file")?;
    let report_path: PathBuf = cli
        .report_path()
        .context("Could not derive a report path from the input file")?;

    let config = cli.pipeline_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        input: &input,
        test: test.as_deref(),
        label: &config.label,
        output: predictions_path.as_deref(),
        train_fraction: config.train_fraction,
        correlation_threshold: config.correlation_threshold,
        trees: config.trees,
        folds: config.folds,
    });

    // Step 1: Load tables
    print_step_header(1, "Loading Data");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading training table...");
    let train_table = load_dataset(&input, &config.load)?;
    let train_stats = dataset_stats(&train_table);
    finish_with_success(
        &spinner,
        &format!(
            "Loaded {} rows × {} columns ({:.1} MB)",
            train_stats.rows, train_stats.columns, train_stats.memory_mb
        ),
    );

    let test_table = match &test {
        Some(path) => {
            let spinner = create_spinner("Loading test table...");
            let table = load_dataset(path, &config.load)?;
            let stats = dataset_stats(&table);
            finish_with_success(
                &spinner,
                &format!("Loaded {} rows × {} columns", stats.rows, stats.columns),
            );
            Some(table)
        }
        None => {
            print_info("No test table given; skipping the grading step");
            None
        }
    };
    let test_stats = test_table.as_ref().map(dataset_stats);
    let load_time = step_start.elapsed();
    print_step_time(load_time);

    // Step 2: Stratified partition
    print_step_header(2, "Stratified Partition");
    let step_start = Instant::now();
    let partition = stratified_split(
        &train_table,
        &config.label,
        config.train_fraction,
        config.seed,
    )?;
    print_count(
        "training rows",
        partition.train_rows.len(),
        Some(format!("({:.0}%)", config.train_fraction * 100.0).as_str()),
    );
    print_count("holdout rows", partition.holdout_rows.len(), None);
    for (class, share) in label_distribution(&partition.train, &config.label)? {
        println!(
            "        {} {:<8} {}",
            style("•").dim(),
            class,
            style(format!("{:.1}%", share * 100.0)).dim()
        );
    }
    let partition_time = step_start.elapsed();
    print_step_time(partition_time);

    // Step 3: Feature reduction on the training split only
    print_step_header(3, "Feature Reduction");
    let step_start = Instant::now();
    let spinner = create_spinner("Dropping metadata, null columns and correlated features...");
    let reducer = FeatureReducer::new(config.reducer());
    let outcome = reducer.reduce(&partition.train)?;
    if outcome.merit > 0.0 {
        finish_with_success(
            &spinner,
            &format!("Selected {} features", outcome.selected.len()),
        );
    } else {
        finish_with_warning(
            &spinner,
            "Subset search found no merit; kept the top-ranked feature",
        );
    }
    print_count("null or non-numeric columns", outcome.dropped_null.len(), None);
    print_count(
        "correlated pairs",
        outcome.correlated_pairs.len(),
        Some(format!("(|r| > {:.2})", config.correlation_threshold).as_str()),
    );
    let reduction_time = step_start.elapsed();
    print_step_time(reduction_time);

    let mut summary = ReductionSummary::from_outcome(&outcome);

    // Step 4: Train and evaluate
    print_step_header(4, "Training Random Forest");
    let step_start = Instant::now();
    let backend = SmartcoreForest;
    let spinner = create_spinner(&format!(
        "Cross-validating mtry over {} folds...",
        config.folds
    ));
    let trainer = Trainer::new(&backend, config.trainer());
    let model = trainer.train(&partition.train, &outcome.selected)?;
    finish_with_success(
        &spinner,
        &format!(
            "Fitted {} trees (mtry = {})",
            model.params.trees, model.params.mtry
        ),
    );
    display_cross_validation(&model.cross_validation, model.params.mtry);

    let spinner = create_spinner("Evaluating on the holdout split...");
    let confusion = evaluate(&model, &backend, &partition.holdout)?;
    finish_with_success(
        &spinner,
        &format!("Holdout accuracy {:.2}%", confusion.accuracy_pct()),
    );
    let training_time = step_start.elapsed();
    print_step_time(training_time);
    display_confusion_matrix(&confusion);

    // Step 5: Grade the test table and save artifacts
    print_step_header(5, "Grading & Saving");
    let step_start = Instant::now();
    if let (Some(table), Some(path)) = (&test_table, &predictions_path) {
        check_feature_schema(table, &model.features)
            .context("Test table does not carry the selected features")?;
        let spinner = create_spinner("Grading test table...");
        let predictions = model.predict_frame(&backend, table)?;
        let mut graded = append_predictions(table, &config.prediction_column(), &predictions)?;
        save_dataset(&mut graded, path)?;
        finish_with_success(
            &spinner,
            &format!("Graded {} rows → {}", predictions.len(), path.display()),
        );
    }

    save_model(&model_path, &model, &config.load.null_tokens)?;
    print_success(&format!("Model saved to {}", model_path.display()));

    let report = RunReport {
        metadata: RunMetadata::new(
            &RunFiles {
                input: &input,
                test: test.as_deref(),
                predictions: test.as_ref().and(predictions_path.as_deref()),
                model: Some(&model_path),
            },
            &config,
        ),
        train_stats,
        test_stats,
        train_rows: partition.train_rows.len(),
        holdout_rows: partition.holdout_rows.len(),
        reduction: outcome,
        forest: model.params,
        cross_validation: model.cross_validation.clone(),
        evaluation: EvaluationSummary::from_confusion(&confusion),
    };
    export_run_report(&report, &report_path)?;
    print_success(&format!("Run report saved to {}", report_path.display()));
    let saving_time = step_start.elapsed();
    print_step_time(saving_time);

    summary.record_time("Loading", load_time);
    summary.record_time("Partition", partition_time);
    summary.record_time("Reduction", reduction_time);
    summary.record_time("Training", training_time);
    summary.record_time("Grading & saving", saving_time);
    summary.display();

    print_completion();

    Ok(())
}
