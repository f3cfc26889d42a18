//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use printability_lib::format_probability;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of rows
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color the verdict line
pub fn color_verdict(verdict: bool, label: &str) -> String {
    if verdict {
        label.green().bold().to_string()
    } else {
        label.red().bold().to_string()
    }
}

/// Color a probability based on how far it sits from the decision boundary
pub fn color_probability(probability: f64) -> String {
    let formatted = format_probability(probability);
    if probability >= 0.75 {
        formatted.green().to_string()
    } else if probability > 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Format a float for table cells, trimming to a readable precision
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.3}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
