//! Reduction summary report generation

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::ReductionOutcome;

/// Summary of the feature reduction process
#[derive(Debug, Default, Serialize)]
pub struct ReductionSummary {
    pub initial_features: usize,
    pub final_features: usize,
    pub dropped_metadata: Vec<String>,
    pub dropped_null: Vec<String>,
    pub dropped_correlation: Vec<String>,
    pub dropped_low_merit: Vec<String>,
    pub selected: Vec<String>,
    pub merit: f64,
    #[serde(skip)]
    pub step_times: Vec<(String, Duration)>,
}

impl ReductionSummary {
    pub fn from_outcome(outcome: &ReductionOutcome) -> Self {
        let dropped_low_merit = outcome
            .surviving
            .iter()
            .filter(|f| !outcome.selected.contains(f))
            .cloned()
            .collect();

        Self {
            initial_features: outcome.initial_features.len(),
            final_features: outcome.selected.len(),
            dropped_metadata: outcome.dropped_metadata.clone(),
            dropped_null: outcome.dropped_null.clone(),
            dropped_correlation: outcome.dropped_correlation.clone(),
            dropped_low_merit,
            selected: outcome.selected.clone(),
            merit: outcome.merit,
            step_times: Vec::new(),
        }
    }

    pub fn record_time(&mut self, step: &str, elapsed: Duration) {
        self.step_times.push((step.to_string(), elapsed));
    }

    fn drop_cell(count: usize) -> Cell {
        Cell::new(count).fg(if count == 0 { Color::White } else { Color::Red })
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("REDUCTION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("🏷️  Metadata Columns"),
            Cell::new(self.dropped_metadata.len()).fg(Color::DarkGrey),
        ]);
        table.add_row(vec![
            Cell::new("📁 Candidate Features"),
            Cell::new(self.initial_features),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped (Nulls)"),
            Self::drop_cell(self.dropped_null.len()),
        ]);
        table.add_row(vec![
            Cell::new("🔗 Dropped (Correlation)"),
            Self::drop_cell(self.dropped_correlation.len()),
        ]);
        table.add_row(vec![
            Cell::new("📉 Not Selected (CFS)"),
            Self::drop_cell(self.dropped_low_merit.len()),
        ]);
        table.add_row(vec![
            Cell::new("✅ Selected Features"),
            Cell::new(self.final_features)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("⭐ Subset Merit"),
            Cell::new(format!("{:.4}", self.merit)).fg(Color::Cyan),
        ]);

        for (step, elapsed) in &self.step_times {
            table.add_row(vec![
                Cell::new(format!("⏱️  {}", step)),
                Cell::new(format!("{:.2}s", elapsed.as_secs_f64())).fg(Color::DarkGrey),
            ]);
        }

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.selected.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("SELECTED FEATURES").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for feature in &self.selected {
                println!("        {} {}", style("•").dim(), feature);
            }
        }

        if !self.dropped_correlation.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("High Correlation").yellow(),
                style(format!("({})", self.dropped_correlation.len())).dim()
            );
            for feature in &self.dropped_correlation {
                println!("        {} {}", style("•").dim(), feature);
            }
        }
    }
}
