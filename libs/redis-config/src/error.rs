//! Error types for configuration parsing.

use thiserror::Error;

/// Errors that can occur when parsing addresses, options, or rendered artifacts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The address is not `host:port` or `host port`.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// The placement is not `first` or `last`.
    #[error("invalid address placement '{0}': expected 'first' or 'last'")]
    InvalidPlacement(String),

    /// A directive cannot be rendered as a single `<key> <value>` line.
    #[error("invalid directive '{key}': {reason}")]
    InvalidDirective { key: String, reason: &'static str },

    /// A directive appears more than once in a rendered artifact.
    #[error("duplicate directive '{key}' at line {line}")]
    DuplicateDirective { line: usize, key: String },
}
