//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Could not read document {}", .path.display())]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse document {}: {message}", .path.display())]
    InvalidDocument { path: PathBuf, message: String },

    #[error("Drift detected: {0}")]
    Drift(String),
}

/// Exit code for a detected drift when `--exit-code` is given.
pub const DRIFT_EXIT_CODE: i32 = 2;

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::InvalidSetting { name, .. } => {
                eprintln!(
                    "\n{}",
                    format!("Hint: Unset {name} to use the default.").yellow()
                );
            }
            CliError::InvalidDocument { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Documents are TOML, or JSON when the file ends in .json.".yellow()
                );
            }
            _ => {}
        }
    }
}

/// Process exit code for an error.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CliError>() {
        Some(CliError::Drift(_)) => DRIFT_EXIT_CODE,
        _ => 1,
    }
}
