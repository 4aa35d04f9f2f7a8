//! Error types for holdings_rs
//!
//! Missing form fields are not errors: an incomplete form is simply not
//! submitted. Everything here is something the user typed that cannot be
//! accepted, or a snapshot file that cannot be read.

use thiserror::Error;

/// Validation errors for user input in the TUI.
///
/// These errors are shown directly to users and should be clear and actionable.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid {field} format: {input}")]
    InvalidNumber { field: &'static str, input: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("No holding at position {index}")]
    NoSuchHolding { index: usize },
}

/// Errors loading a portfolio snapshot.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Error reading file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Portfolio file is not well-formatted: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value in portfolio file: {0}")]
    Invalid(#[from] ValidationError),
}
