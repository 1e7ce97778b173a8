//! Typed store configuration

use tessera_storage::TableStorageOptions;

/// Options for opening a [`TypedTableStore`](crate::TypedTableStore)
#[derive(Debug, Clone, Default)]
pub struct TypedStoreOptions {
    /// Options for the underlying table
    pub table_storage: TableStorageOptions,
    /// Record properties that are never written to the table
    pub ignored_properties: Vec<String>,
}

impl TypedStoreOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the underlying table options
    pub fn table_storage(mut self, options: TableStorageOptions) -> Self {
        self.table_storage = options;
        self
    }

    /// Never write `property`
    pub fn ignore(mut self, property: impl Into<String>) -> Self {
        self.ignored_properties.push(property.into());
        self
    }
}
