//! Core types for Tessera
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`TableEntity`], [`EntityKey`], [`ETag`]: table rows and their addresses
//! - [`PropertyValue`]: typed row properties
//! - [`PagedResult`], [`ContinuationToken`]: paged scans
//! - [`StoreError`]: failures with HTTP-like status classes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod paging;
pub mod types;
pub mod value;

pub use error::{Result, StoreError};
pub use paging::{ContinuationToken, PagedResult};
pub use types::{ETag, EntityKey, TableEntity, WILDCARD_ETAG};
pub use value::PropertyValue;
