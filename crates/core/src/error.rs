//! Error types for table operations
//!
//! Every failure reported by a table service maps onto a [`StoreError`].
//! Each variant carries an HTTP-like status class so callers can tell
//! a missing row (404) apart from a conflict (409) or a stale etag (412)
//! without matching on every variant.

use thiserror::Error;

/// Errors raised by table services and typed stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist
    #[error("entity not found: ({partition_key}, {row_key}) in table {table}")]
    EntityNotFound {
        /// Table name
        table: String,
        /// Partition key of the missing row
        partition_key: String,
        /// Row key of the missing row
        row_key: String,
    },

    /// The table does not exist
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Insert of a row whose key is already taken
    #[error("entity already exists: ({partition_key}, {row_key}) in table {table}")]
    EntityAlreadyExists {
        /// Table name
        table: String,
        /// Partition key of the conflicting row
        partition_key: String,
        /// Row key of the conflicting row
        row_key: String,
    },

    /// Etag on an update or delete did not match the stored row
    #[error("precondition failed: etag {expected} does not match {actual}")]
    PreconditionFailed {
        /// Etag supplied by the caller
        expected: String,
        /// Etag currently stored
        actual: String,
    },

    /// Key or table name rejected by the service
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Malformed continuation token
    #[error("invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    /// Object <-> row conversion failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure
    #[error("backend error ({status}): {message}")]
    Backend {
        /// Status class reported by the backend
        status: u16,
        /// Human-readable message
        message: String,
    },
}

/// Result type for table operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// HTTP-like status class of this error
    pub fn status(&self) -> u16 {
        match self {
            StoreError::EntityNotFound { .. } | StoreError::TableNotFound(_) => 404,
            StoreError::EntityAlreadyExists { .. } => 409,
            StoreError::PreconditionFailed { .. } => 412,
            StoreError::InvalidKey(_)
            | StoreError::InvalidContinuationToken(_)
            | StoreError::Serialization(_) => 400,
            StoreError::Backend { status, .. } => *status,
        }
    }

    /// Check if this is a not-found (404-class) error
    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }

    /// Check if this is a conflict (409) error
    pub fn is_conflict(&self) -> bool {
        self.status() == 409
    }

    /// Check if the backend may succeed when the call is repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self.status(), 408 | 429 | 500..=599)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
