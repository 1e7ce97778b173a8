//! Typed record stores for Tessera
//!
//! Maps plain serde records onto table rows:
//! - TypedTableStore: typed CRUD, scans, paging and events over one table
//! - KeysConverter: record <-> row mapping (simple and calculated)
//! - KeyMapper: property, fixed, calculated and sequential keys
//! - StoreEvents: observer lists raised by every mutation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod converter;
pub mod events;
pub mod keys;
pub mod options;
pub mod store;

pub use converter::{CalculatedKeysConverter, KeysConverter, SimpleKeysConverter};
pub use events::{AsyncHandler, EventList, Handler, StoreEvents, SubscriptionId};
pub use keys::{sequential_key, KeyMapper};
pub use options::TypedStoreOptions;
pub use store::TypedTableStore;
