//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sim_lib::{FailurePattern, HealthStatus};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or the raw value as pretty JSON
pub fn print_rows<R: Tabled, J: Serialize + ?Sized>(
    rows: Vec<R>,
    raw: &J,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No items found".yellow());
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(raw)?),
    }
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_ms(value: f64) -> String {
    if value >= 1000.0 {
        format!("{:.2}s", value / 1000.0)
    } else {
        format!("{:.0}ms", value)
    }
}

pub fn color_status(status: HealthStatus) -> String {
    let text = status.as_str();
    match status {
        HealthStatus::Healthy => text.green().to_string(),
        HealthStatus::Warning => text.yellow().to_string(),
        HealthStatus::Critical => text.red().bold().to_string(),
    }
}

pub fn color_pattern(pattern: FailurePattern) -> String {
    let text = pattern.as_str();
    match pattern {
        FailurePattern::CascadeFailure | FailurePattern::DatabaseLock => text.red().to_string(),
        FailurePattern::GradualDegradation | FailurePattern::MemoryLeak => {
            text.yellow().to_string()
        }
        _ => text.magenta().to_string(),
    }
}

/// Color a 0-100 quality score
pub fn color_score(score: u32) -> String {
    let formatted = format!("{}/100", score);
    if score >= 80 {
        formatted.green().to_string()
    } else if score >= 60 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
