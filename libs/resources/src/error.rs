//! Error types for quantity parsing.

use thiserror::Error;

/// Errors that can occur when parsing a resource quantity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The quantity string is empty.
    #[error("quantity cannot be empty")]
    Empty,

    /// The numeric portion is missing or malformed.
    #[error("invalid quantity number: '{0}'")]
    InvalidNumber(String),

    /// The suffix is not a known SI, binary SI, or exponent suffix.
    #[error("unknown quantity suffix: '{0}'")]
    UnknownSuffix(String),

    /// The value does not fit in the exact representation.
    #[error("quantity out of range: '{0}'")]
    OutOfRange(String),
}
