//! Secondary index maintenance for Tessera
//!
//! Keeps secondary index tables in sync with a primary typed store:
//! - IndexRegistry: name -> index store (+ predicate) map behind one lock
//! - Indexes: attach/detach, lookups and reindex for one primary store
//! - SecondaryIndexes: `indexes()` on `Arc<TypedTableStore>`
//! - IndexStore: record-typed index surface, implemented by TypedTableStore
//! - ReindexOptions: bounded-concurrency rebuild configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

mod attach;
pub mod error;
pub mod indexes;
mod lookup;
pub mod registry;
pub mod reindex;
pub mod store;

pub use error::{IndexError, Result};
pub use indexes::{Indexes, SecondaryIndexes};
pub use registry::{IndexRegistry, Predicate};
pub use reindex::{
    FailureCallback, ProgressCallback, ReindexOptions, DEFAULT_GATE_TIMEOUT,
    DEFAULT_REINDEX_PAGE_SIZE,
};
pub use store::IndexStore;
pub use tokio_util::sync::CancellationToken;
