//! Document error types

use thiserror::Error;

/// Result type for document operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while reading or writing a document
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input has no header line
    #[error("Document has no header row")]
    MissingHeader,

    /// Core error (e.g. a row narrower or wider than the header)
    #[error("Core error: {0}")]
    Core(#[from] gridsave_core::Error),
}
