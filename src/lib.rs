//! # Tessera
//!
//! Typed object mapping over key-value tables, with secondary indexes kept
//! in sync automatically.
//!
//! Records are plain serde types stored in tables addressed by a partition
//! key and a row key. A secondary index is a second table holding the same
//! records under different keys; once attached, every write to the primary
//! table is mirrored into it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tessera::prelude::*;
//!
//! let db = Tessera::ephemeral();
//! let employees = db.simple_store::<Employee, i64, i64>("Employees", "company_id", "id")?;
//! let by_name =
//!     db.simple_store::<Employee, i64, String>("EmployeesByName", "company_id", "name")?;
//!
//! // Attach, write, look up
//! db.indexes(&employees).add_index("Name", by_name)?;
//! employees.insert(&employee)?;
//! let found = db.indexes(&employees).get_record_by_index_raw("Name", "99", "Test")?;
//!
//! // Backfill rows written before the index existed
//! let count = db.indexes(&employees).reindex("Name", ReindexOptions::new()).await?;
//! ```
//!
//! ## Crates
//!
//! - [`tessera_core`] - rows, etags, paging, store errors
//! - [`tessera_storage`] - table trait and the in-memory table service
//! - [`tessera_typed`] - typed stores, key mapping, events
//! - [`tessera_index`] - index registry, propagation, lookups, reindex

#![warn(missing_docs)]

mod database;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{Tessera, TesseraBuilder};
pub use error::{Error, Result};

// Re-export types
pub use types::*;

// Re-export member crates
pub use tessera_core;
pub use tessera_index;
pub use tessera_storage;
pub use tessera_typed;
