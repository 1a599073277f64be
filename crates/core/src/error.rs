// Central Error Type for the Application

use thiserror::Error;

use crate::domain::DecodeError;
use crate::port::ProcessError;

/// Application-level error type
///
/// Every device operation reports exactly one of these to its immediate
/// caller. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid device identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True when the failure came from the identifier gate (no process was spawned)
    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, AppError::InvalidIdentifier(_))
    }
}
