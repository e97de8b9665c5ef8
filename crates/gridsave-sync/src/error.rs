//! Error types for saving.

use thiserror::Error;

/// Failure reported by (or while talking to) the persistence service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Submission rejected ({code}): {message}")]
    Failed { code: u16, message: String },

    #[error("Invalid status response: {0}")]
    InvalidResponse(String),

    #[error("Malformed status response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persistence service unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`SaveSession`](crate::SaveSession) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Grid error: {0}")]
    Core(#[from] gridsave_core::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
