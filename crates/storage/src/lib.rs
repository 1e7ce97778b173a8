//! Table storage layer for Tessera
//!
//! This crate defines the table abstraction the typed layer is built on:
//! - TableStore: synchronous per-table contract
//! - TableStoreAsync: async variants over the blocking pool
//! - MemoryTableService: in-memory implementation with paging and etags
//! - TableStorageOptions: open-time configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod options;
pub mod traits;

pub use memory::{MemoryTableService, MemoryTableStore};
pub use options::TableStorageOptions;
pub use traits::{TableStore, TableStoreAsync, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
