//! Secondary index facade
//!
//! [`Indexes`] binds a primary store to a registry. Attachment, lookup and
//! reindex operations are implemented on it in their own modules.
//! [`SecondaryIndexes`] adds `indexes()` to `Arc<TypedTableStore>`.
//!
//! # Example
//!
//! ```ignore
//! use tessera_index::SecondaryIndexes;
//!
//! employees.indexes().add_index("Name", by_name)?;
//! employees.insert(&employee)?;
//! let found = employees.indexes().get_record_by_index_raw("Name", "99", "Test")?;
//! ```

use crate::registry::IndexRegistry;
use std::sync::Arc;
use tessera_typed::TypedTableStore;

/// Index operations for one primary store against one registry
pub struct Indexes<'a, T, PK, RK> {
    pub(crate) registry: &'a IndexRegistry,
    pub(crate) primary: &'a Arc<TypedTableStore<T, PK, RK>>,
}

impl<'a, T, PK, RK> Indexes<'a, T, PK, RK> {
    /// Bind `primary` to `registry`
    pub fn new(registry: &'a IndexRegistry, primary: &'a Arc<TypedTableStore<T, PK, RK>>) -> Self {
        Self { registry, primary }
    }

    /// The registry operations go through
    pub fn registry(&self) -> &'a IndexRegistry {
        self.registry
    }

    /// The primary store
    pub fn primary(&self) -> &'a Arc<TypedTableStore<T, PK, RK>> {
        self.primary
    }
}

/// Secondary index operations on a shared typed store
pub trait SecondaryIndexes<T, PK, RK> {
    /// Index operations against the process-wide registry
    fn indexes(&self) -> Indexes<'_, T, PK, RK>;

    /// Index operations against an explicit registry
    fn indexes_in<'a>(&'a self, registry: &'a IndexRegistry) -> Indexes<'a, T, PK, RK>;
}

impl<T, PK, RK> SecondaryIndexes<T, PK, RK> for Arc<TypedTableStore<T, PK, RK>> {
    fn indexes(&self) -> Indexes<'_, T, PK, RK> {
        Indexes::new(IndexRegistry::global(), self)
    }

    fn indexes_in<'a>(&'a self, registry: &'a IndexRegistry) -> Indexes<'a, T, PK, RK> {
        Indexes::new(registry, self)
    }
}
