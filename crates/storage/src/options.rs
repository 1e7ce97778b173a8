//! Table storage configuration

/// Options applied when a table store is opened
///
/// ```ignore
/// let opts = TableStorageOptions::new().ensure_table_exists(false);
/// let store = service.open_table("Employees", opts)?;
/// ```
#[derive(Debug, Clone)]
pub struct TableStorageOptions {
    /// Create the table when the store is opened
    pub ensure_table_exists: bool,
}

impl TableStorageOptions {
    /// Default options: tables are created on open
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the table is created on open
    pub fn ensure_table_exists(mut self, ensure: bool) -> Self {
        self.ensure_table_exists = ensure;
        self
    }
}

impl Default for TableStorageOptions {
    fn default() -> Self {
        Self {
            ensure_table_exists: true,
        }
    }
}
