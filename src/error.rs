//! Custom error types for pocket-ledger
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. The user-facing variants carry a message
//! that is sent back verbatim as the chat reply.

use thiserror::Error;

/// The main error type for pocket-ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unknown transaction type word
    #[error("{0}")]
    InvalidType(String),

    /// Command arguments do not match the expected grammar
    #[error("{0}")]
    InvalidFormat(String),

    /// Month argument outside 1-12 or not a known month name
    #[error("{0}")]
    InvalidMonth(String),

    /// Year argument outside the accepted range
    #[error("{0}")]
    InvalidYear(String),

    /// Filter arguments failed validation
    #[error("{0}")]
    Validation(String),

    /// A write or read against the store failed
    #[error("{0}")]
    Internal(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for pocket-ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
