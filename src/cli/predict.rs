//! Grade a table with a saved model artifact

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::{
    append_predictions, load_dataset, load_saved_model, save_dataset, LoadOptions, SmartcoreForest,
    SmartcoreModel,
};
use crate::utils::create_spinner;

use super::args::derive_predictions_path;

/// Load a model artifact, apply it to `input`, and write the augmented table.
///
/// The model is used as saved; nothing is refitted. The table is parsed with
/// the null tokens recorded at training time plus `extra_null_tokens`.
/// Returns the path written.
pub fn run_predict(
    model_path: &Path,
    input: &Path,
    output: Option<&Path>,
    infer_schema_length: usize,
    extra_null_tokens: &[String],
) -> Result<PathBuf> {
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derive_predictions_path(input));

    println!("\n {} Grading with saved model", style("◆").cyan().bold());
    println!("   Model:  {}", style(model_path.display()).dim());
    println!("   Input:  {}", style(input.display()).dim());
    println!("   Output: {}", style(output_path.display()).dim());
    println!();

    let spinner = create_spinner("Loading model...");
    let saved = load_saved_model::<SmartcoreModel>(model_path)?;
    let model = saved.trained;
    spinner.finish_with_message(format!(
        "{} Model loaded ({} features, {} classes)",
        style("✓").green(),
        model.features.len(),
        model.encoding.len()
    ));

    let options = LoadOptions {
        null_tokens: saved.null_tokens,
        infer_schema_length,
    }
    .with_extra_null_tokens(extra_null_tokens);
    let df = load_dataset(input, &options)?;

    let spinner = create_spinner("Predicting...");
    let predictions = model
        .predict_frame(&SmartcoreForest, &df)
        .with_context(|| format!("Failed to grade {}", input.display()))?;
    let column = format!("predicted_{}", model.label);
    let mut graded = append_predictions(&df, &column, &predictions)?;
    spinner.finish_with_message(format!(
        "{} Graded {} rows",
        style("✓").green(),
        style(predictions.len()).yellow()
    ));

    save_dataset(&mut graded, &output_path)?;

    println!();
    println!(" {} Predictions written!", style("✓").green().bold());

    Ok(output_path)
}
