//! Main entry point for Tessera.
//!
//! This module provides the `Tessera` struct, which owns a table service and
//! an index registry and opens typed stores against them.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tessera_index::{IndexRegistry, Indexes};
use tessera_storage::{MemoryTableService, MemoryTableStore, TableStorageOptions};
use tessera_typed::{KeysConverter, SimpleKeysConverter, TypedStoreOptions, TypedTableStore};
use tracing::debug;

/// A Tessera instance.
///
/// Create one with [`Tessera::ephemeral`] or [`Tessera::builder`].
///
/// # Example
///
/// ```ignore
/// use tessera::prelude::*;
///
/// let db = Tessera::ephemeral();
/// let employees = db.simple_store::<Employee, i64, i64>("Employees", "company_id", "id")?;
/// let by_name =
///     db.simple_store::<Employee, i64, String>("EmployeesByName", "company_id", "name")?;
///
/// db.indexes(&employees).add_index("Name", by_name)?;
/// employees.insert(&employee)?;
/// let hit = db.indexes(&employees).get_record_by_index_raw("Name", "99", "Test")?;
/// ```
pub struct Tessera {
    service: Arc<MemoryTableService>,
    registry: IndexRegistry,
    table_options: TableStorageOptions,
}

impl Tessera {
    /// Create an in-memory instance with a private index registry.
    pub fn ephemeral() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuration.
    pub fn builder() -> TesseraBuilder {
        TesseraBuilder::new()
    }

    /// The table service backing this instance.
    pub fn service(&self) -> &Arc<MemoryTableService> {
        &self.service
    }

    /// The index registry used by [`Tessera::indexes`].
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Names of all existing tables.
    pub fn table_names(&self) -> Vec<String> {
        self.service.table_names()
    }

    /// Open an untyped table.
    pub fn table(&self, name: &str) -> Result<Arc<MemoryTableStore>> {
        Ok(self.service.open_table(name, self.table_options.clone())?)
    }

    /// Open a typed store with a custom keys converter.
    pub fn store<T, PK, RK>(
        &self,
        name: &str,
        converter: impl KeysConverter<T, PK, RK> + 'static,
    ) -> Result<Arc<TypedTableStore<T, PK, RK>>>
    where
        T: Clone + Send + Sync + 'static,
        PK: Send + Sync + 'static,
        RK: Send + Sync + 'static,
    {
        let options = TypedStoreOptions::new().table_storage(self.table_options.clone());
        self.store_with_options(name, converter, options)
    }

    /// Open a typed store with explicit options.
    pub fn store_with_options<T, PK, RK>(
        &self,
        name: &str,
        converter: impl KeysConverter<T, PK, RK> + 'static,
        options: TypedStoreOptions,
    ) -> Result<Arc<TypedTableStore<T, PK, RK>>>
    where
        T: Clone + Send + Sync + 'static,
        PK: Send + Sync + 'static,
        RK: Send + Sync + 'static,
    {
        let store = TypedTableStore::open(&self.service, name, converter, options)?;
        debug!(table = name, "Opened typed store");
        Ok(Arc::new(store))
    }

    /// Open a typed store keyed on two record properties.
    pub fn simple_store<T, PK, RK>(
        &self,
        name: &str,
        partition_property: &str,
        row_property: &str,
    ) -> Result<Arc<TypedTableStore<T, PK, RK>>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        PK: Display + Send + Sync + 'static,
        RK: Display + Send + Sync + 'static,
    {
        self.store(name, SimpleKeysConverter::new(partition_property, row_property))
    }

    /// Index operations for `primary` against this instance's registry.
    pub fn indexes<'a, T, PK, RK>(
        &'a self,
        primary: &'a Arc<TypedTableStore<T, PK, RK>>,
    ) -> Indexes<'a, T, PK, RK> {
        Indexes::new(&self.registry, primary)
    }
}

/// Builder for Tessera configuration.
///
/// # Example
///
/// ```ignore
/// // Share indexes with code using the process-wide registry
/// let db = Tessera::builder().global_registry().build();
///
/// // Tables must be created explicitly
/// let db = Tessera::builder().ensure_tables_exist(false).build();
/// ```
pub struct TesseraBuilder {
    service: Option<Arc<MemoryTableService>>,
    ensure_tables_exist: bool,
    global_registry: bool,
}

impl TesseraBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            service: None,
            ensure_tables_exist: true,
            global_registry: false,
        }
    }

    /// Use an existing table service instead of a fresh one.
    pub fn service(mut self, service: Arc<MemoryTableService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Create tables when stores are opened (default: true).
    pub fn ensure_tables_exist(mut self, ensure: bool) -> Self {
        self.ensure_tables_exist = ensure;
        self
    }

    /// Use the process-wide index registry instead of a private one.
    pub fn global_registry(mut self) -> Self {
        self.global_registry = true;
        self
    }

    /// Build the instance.
    pub fn build(self) -> Tessera {
        let registry = if self.global_registry {
            IndexRegistry::global().clone()
        } else {
            IndexRegistry::new()
        };
        Tessera {
            service: self
                .service
                .unwrap_or_else(|| Arc::new(MemoryTableService::new())),
            registry,
            table_options: TableStorageOptions::new().ensure_table_exists(self.ensure_tables_exist),
        }
    }
}

impl Default for TesseraBuilder {
    fn default() -> Self {
        Self::new()
    }
}
