//! Error types for the data-loader crate.
//!
//! Every loader in this crate reports failures through [`DataLoadError`],
//! carrying enough context (file, line, column) to locate the bad input.

use thiserror::Error;

/// Errors that can occur while loading score matrices and tabular inputs
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Input file is missing or unreadable
    #[error("Cannot open {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV row or header that doesn't parse; `line` is 1-based
    #[error("{file}:{line}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    /// Row width differs from the header
    #[error("Line {line} has {found} fields, header has {expected}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// A CSV header lacks a column the loader needs
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// Binary array file uses a layout or dtype we can't read
    #[error("Unsupported array format in {file}: {reason}")]
    UnsupportedFormat { file: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
