//! Unified error types for Tessera.
//!
//! This module provides a clean error type that wraps the table and index
//! errors of the member crates and presents a consistent interface to users.

use tessera_core::StoreError;
use tessera_index::IndexError;
use thiserror::Error;

/// All Tessera errors.
///
/// This is the canonical error type for facade operations. Member crate
/// errors convert into it with `?`.
#[derive(Debug, Error)]
pub enum Error {
    /// Table or row not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Row already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stale etag
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Invalid key, table name or continuation token
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend failure with its status code
    #[error("storage error ({status}): {message}")]
    Storage {
        /// HTTP-like status
        status: u16,
        /// Backend message
        message: String,
    },

    /// Index name already attached
    #[error("duplicate index: {0}")]
    DuplicateIndex(String),

    /// Index name not attached
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Index holds a different record or key type
    #[error("index type mismatch: {0}")]
    IndexTypeMismatch(String),

    /// Reindex gave up waiting for a slot
    #[error("timeout: {0}")]
    Timeout(String),

    /// Operation cancelled
    #[error("cancelled")]
    Cancelled,
}

/// Result type for Tessera operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Timeouts, throttling and server-side failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Storage { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }

    /// Check if this is a not-found error (row, table or index).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::IndexNotFound(_))
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_) | Error::PreconditionFailed(_))
    }
}

// Convert from table errors
impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EntityNotFound { .. } | StoreError::TableNotFound(_) => {
                Error::NotFound(e.to_string())
            }
            StoreError::EntityAlreadyExists { .. } => Error::Conflict(e.to_string()),
            StoreError::PreconditionFailed { .. } => Error::PreconditionFailed(e.to_string()),
            StoreError::InvalidKey(msg) | StoreError::InvalidContinuationToken(msg) => {
                Error::InvalidInput(msg)
            }
            StoreError::Serialization(msg) => Error::Serialization(msg),
            StoreError::Backend { status, message } => Error::Storage { status, message },
        }
    }
}

// Convert from index errors
impl From<IndexError> for Error {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::DuplicateIndex(name) => Error::DuplicateIndex(name),
            IndexError::IndexNotFound(name) => Error::IndexNotFound(name),
            e @ IndexError::IndexTypeMismatch { .. } => Error::IndexTypeMismatch(e.to_string()),
            e @ IndexError::GateTimeout(_) => Error::Timeout(e.to_string()),
            IndexError::Cancelled => Error::Cancelled,
            IndexError::Store(e) => e.into(),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
