// Domain Error Types

use thiserror::Error;

/// Failure to turn captured tool output into a domain value.
///
/// A field that is merely absent is NOT a decode error; accessors report
/// absence as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Malformed property list: {0}")]
    Malformed(String),

    #[error("Unexpected document shape: expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field {key:?} has wrong type: expected {expected}")]
    WrongType { key: String, expected: &'static str },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
