//! Public types for the Tessera facade.
//!
//! This module re-exports types from the member crates with a flat public
//! interface.

// Rows and paging
pub use tessera_core::{ContinuationToken, ETag, EntityKey, PagedResult, PropertyValue, TableEntity};
pub use tessera_core::StoreError;

// Tables
pub use tessera_storage::{
    MemoryTableService, MemoryTableStore, TableStorageOptions, TableStore, TableStoreAsync,
    DEFAULT_PAGE_SIZE,
};

// Typed stores
pub use tessera_typed::{
    CalculatedKeysConverter, KeyMapper, KeysConverter, SimpleKeysConverter, StoreEvents,
    SubscriptionId, TypedStoreOptions, TypedTableStore,
};

// Secondary indexes
pub use tessera_index::{
    CancellationToken, IndexError, IndexRegistry, IndexStore, Indexes, Predicate,
    ReindexOptions, SecondaryIndexes,
};
