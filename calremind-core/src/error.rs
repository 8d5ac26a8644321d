//! Error types for the calremind ecosystem.

use thiserror::Error;

/// Errors that can occur in calremind operations.
#[derive(Error, Debug)]
pub enum RemindError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

/// Result type alias for calremind operations.
pub type RemindResult<T> = Result<T, RemindError>;
