//! Convenient imports for Tessera.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use tessera::prelude::*;
//!
//! let db = Tessera::ephemeral();
//! let employees = db.simple_store::<Employee, i64, i64>("Employees", "company_id", "id")?;
//! ```

// Main entry point
pub use crate::database::{Tessera, TesseraBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Typed stores
pub use crate::types::{
    CalculatedKeysConverter, KeyMapper, KeysConverter, SimpleKeysConverter, TypedStoreOptions,
    TypedTableStore,
};

// Secondary indexes
pub use crate::types::{CancellationToken, IndexRegistry, ReindexOptions, SecondaryIndexes};

// Paging
pub use crate::types::PagedResult;
