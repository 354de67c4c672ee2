//! Output formatting for CLI commands.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text and tables.
    #[default]
    Text,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Parse the `--format` flag; anything but `json` is text.
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Print rows as a table.
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No items found.".dimmed());
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Print a single item as pretty JSON.
pub fn print_json<T: Serialize>(data: &T) {
    println!("{}", format_json(data));
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "Drift:".yellow().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

fn format_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}
