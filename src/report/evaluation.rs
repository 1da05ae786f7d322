//! Console tables for cross-validation and holdout evaluation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{ConfusionMatrix, CrossValidationResult};

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

/// Show mean fold accuracy per mtry candidate, marking the chosen one
pub fn display_cross_validation(results: &[CrossValidationResult], chosen_mtry: usize) {
    if results.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("mtry").add_attribute(Attribute::Bold),
        Cell::new("Fold accuracies").add_attribute(Attribute::Bold),
        Cell::new("Mean").add_attribute(Attribute::Bold),
    ]);

    for result in results {
        let folds = result
            .fold_accuracies
            .iter()
            .map(|a| format!("{:.4}", a))
            .collect::<Vec<_>>()
            .join("  ");
        let mean = Cell::new(format!("{:.4}", result.mean_accuracy));
        let mean = if result.mtry == chosen_mtry {
            mean.fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            mean
        };
        table.add_row(vec![Cell::new(result.mtry), Cell::new(folds), mean]);
    }

    print_indented(&table);
}

/// Show the holdout confusion matrix (rows = prediction, columns = reference)
/// followed by accuracy, kappa and per-class statistics
pub fn display_confusion_matrix(cm: &ConfusionMatrix) {
    println!();
    println!(
        "    {} {}",
        style("🎯").cyan(),
        style("HOLDOUT CONFUSION MATRIX").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    let mut header = vec![Cell::new("Prediction \\ Reference").add_attribute(Attribute::Bold)];
    header.extend(
        cm.classes
            .iter()
            .map(|c| Cell::new(c).add_attribute(Attribute::Bold)),
    );
    table.set_header(header);

    for (p, class) in cm.classes.iter().enumerate() {
        let mut row = vec![Cell::new(class).add_attribute(Attribute::Bold)];
        for a in 0..cm.classes.len() {
            let cell = Cell::new(cm.counts[p][a]).set_alignment(CellAlignment::Right);
            row.push(if p == a {
                cell.fg(Color::Green)
            } else if cm.counts[p][a] > 0 {
                cell.fg(Color::Red)
            } else {
                cell
            });
        }
        table.add_row(row);
    }
    print_indented(&table);

    println!();
    let mut stats = Table::new();
    stats.load_preset(UTF8_FULL_CONDENSED);
    stats.set_header(vec![
        Cell::new("Class").add_attribute(Attribute::Bold),
        Cell::new("Sensitivity").add_attribute(Attribute::Bold),
        Cell::new("Specificity").add_attribute(Attribute::Bold),
        Cell::new("Precision").add_attribute(Attribute::Bold),
    ]);
    for s in cm.class_stats() {
        stats.add_row(vec![
            Cell::new(&s.class),
            Cell::new(format!("{:.4}", s.sensitivity)),
            Cell::new(format!("{:.4}", s.specificity)),
            Cell::new(format!("{:.4}", s.precision)),
        ]);
    }
    print_indented(&stats);

    println!();
    println!(
        "      Accuracy:   {}",
        style(format!("{:.2}%", cm.accuracy_pct())).green().bold()
    );
    println!(
        "      Error rate: {}",
        style(format!("{:.2}%", cm.error_rate() * 100.0)).yellow()
    );
    println!("      Kappa:      {}", style(format!("{:.4}", cm.kappa())).cyan());
}
