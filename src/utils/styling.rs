//! Terminal styling utilities for a modern, visually appealing TUI

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");

/// Print the application banner with ASCII art
pub fn print_banner(version: &str) {
    let banner = r#"
    ██████╗ ███████╗██████╗        ██████╗ ██████╗  █████╗ ██████╗ ███████╗
    ██╔══██╗██╔════╝██╔══██╗      ██╔════╝ ██╔══██╗██╔══██╗██╔══██╗██╔════╝
    ██████╔╝█████╗  ██████╔╝█████╗██║  ███╗██████╔╝███████║██║  ██║█████╗
    ██╔══██╗██╔══╝  ██╔═══╝ ╚════╝██║   ██║██╔══██╗██╔══██║██║  ██║██╔══╝
    ██║  ██║███████╗██║           ╚██████╔╝██║  ██║██║  ██║██████╔╝███████╗
    ╚═╝  ╚═╝╚══════╝╚═╝            ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚══════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("◆").magenta().bold(),
        style("Grading exercise repetitions from sensor readings").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Values shown in the configuration card
pub struct ConfigCard<'a> {
    pub input: &'a Path,
    pub test: Option<&'a Path>,
    pub label: &'a str,
    pub output: Option<&'a Path>,
    pub train_fraction: f64,
    pub correlation_threshold: f64,
    pub trees: u16,
    pub folds: usize,
}

/// Print configuration card
pub fn print_config(card: &ConfigCard<'_>) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);
    let none = "-".to_string();

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Train:  {:<39}│",
        FOLDER,
        truncate_path(card.input, 38)
    );
    println!(
        "    │  {} Test:   {:<39}│",
        FOLDER,
        card.test.map(|p| truncate_path(p, 38)).unwrap_or_else(|| none.clone())
    );
    println!(
        "    │  {} Label:  {:<39}│",
        TARGET,
        truncate_string(card.label, 38)
    );
    println!(
        "    │  {} Output: {:<39}│",
        SAVE,
        card.output.map(|p| truncate_path(p, 38)).unwrap_or(none)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Train fraction:        {:<24}│",
        CHART,
        style(format!("{:.0}%", card.train_fraction * 100.0)).yellow()
    );
    println!(
        "    │  {} Correlation threshold: {:<24}│",
        LINK,
        style(format!("{:.2}", card.correlation_threshold)).yellow()
    );
    println!(
        "    │  {} Trees / CV folds:      {:<24}│",
        TREE,
        style(format!("{} / {}", card.trees, card.folds)).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("({:.2}s)", elapsed.as_secs_f64())).dim()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Rep-grade run complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, threshold_info: Option<&str>) {
    if let Some(info) = threshold_info {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!(
            "      Found {} {}",
            style(count).yellow().bold(),
            description
        );
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}
