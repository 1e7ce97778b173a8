//! Index error types

use std::time::Duration;
use tessera_core::StoreError;
use thiserror::Error;

/// Result type for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Index errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// An index with this name is already attached
    #[error("{0} has already been added")]
    DuplicateIndex(String),

    /// No index with this name is attached
    #[error("{0} is not a defined secondary index")]
    IndexNotFound(String),

    /// The index exists but stores a different record or key type
    #[error("index {name} is not a {expected}")]
    IndexTypeMismatch {
        /// Index name
        name: String,
        /// Type the caller asked for
        expected: &'static str,
    },

    /// No reindex slot freed up in time
    #[error("no reindex slot became free within {0:?}")]
    GateTimeout(Duration),

    /// Reindex was cancelled by its token
    #[error("reindex cancelled")]
    Cancelled,

    /// Error from the underlying table
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IndexError {
    /// True for a missing index name
    pub fn is_index_not_found(&self) -> bool {
        matches!(self, IndexError::IndexNotFound(_))
    }

    /// True for registry misuse: duplicate name, unknown name, wrong type
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            IndexError::DuplicateIndex(_)
                | IndexError::IndexNotFound(_)
                | IndexError::IndexTypeMismatch { .. }
        )
    }
}
