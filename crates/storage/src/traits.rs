//! Table store abstraction
//!
//! [`TableStore`] is the synchronous contract every table backend
//! implements; it is scoped to one named table. [`TableStoreAsync`] adds
//! async variants for `Arc<dyn TableStore>` that offload each call to the
//! blocking thread pool so async callers never stall the runtime.
//!
//! ## Error Contract
//!
//! Implementations should:
//! - Return `TableNotFound` for row operations on a table that does not exist
//! - Return `EntityNotFound` for update/delete of a missing row
//! - Return `EntityAlreadyExists` for insert over an existing row
//! - Return `PreconditionFailed` when a non-wildcard etag is stale

use std::sync::Arc;
use tessera_core::{PagedResult, Result, StoreError, TableEntity};

/// Default page size for paged scans
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page a single scan returns
pub const MAX_PAGE_SIZE: usize = 1000;

/// A single named table
///
/// Implementations must be thread-safe (Send + Sync) to allow concurrent access.
pub trait TableStore: Send + Sync {
    /// Name of the table this store addresses
    fn table_name(&self) -> &str;

    /// Create the table. Succeeds if it already exists.
    fn create_table(&self) -> Result<()>;

    /// Delete the table and all its rows. Succeeds if it does not exist.
    fn delete_table(&self) -> Result<()>;

    /// Check if the table exists
    fn table_exists(&self) -> Result<bool>;

    /// Insert a new row; fails if the key is taken
    fn insert(&self, entity: TableEntity) -> Result<()>;

    /// Insert several new rows atomically
    ///
    /// Either all rows are written or none are.
    fn insert_many(&self, entities: Vec<TableEntity>) -> Result<()>;

    /// Insert a row, replacing any existing row with the same key
    fn insert_or_replace(&self, entity: TableEntity) -> Result<()>;

    /// Insert or replace several rows atomically
    ///
    /// Either all rows are written or none are.
    fn insert_or_replace_many(&self, entities: Vec<TableEntity>) -> Result<()>;

    /// Replace an existing row
    ///
    /// The entity's etag (if any) must match the stored one.
    fn update(&self, entity: TableEntity) -> Result<()>;

    /// Delete an existing row
    ///
    /// The entity's etag (if any) must match the stored one.
    fn delete(&self, entity: TableEntity) -> Result<()>;

    /// Point read. Returns `Ok(None)` if the row does not exist.
    fn get_record(&self, partition_key: &str, row_key: &str) -> Result<Option<TableEntity>>;

    /// All rows of one partition, in row key order
    fn get_by_partition_key(&self, partition_key: &str) -> Result<Vec<TableEntity>>;

    /// One page of a partition scan
    fn get_by_partition_key_paged(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<TableEntity>>;

    /// All rows with the given row key, across partitions
    ///
    /// This is a full table scan.
    fn get_by_row_key(&self, row_key: &str) -> Result<Vec<TableEntity>>;

    /// One page of a row key scan
    fn get_by_row_key_paged(
        &self,
        row_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<TableEntity>>;

    /// Every row in the table
    fn get_all_records(&self) -> Result<Vec<TableEntity>>;

    /// One page of a full table scan
    fn get_all_records_paged(
        &self,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<TableEntity>>;

    /// Number of rows in the table
    fn get_record_count(&self) -> Result<usize>;
}

/// Extension trait providing async versions of TableStore methods.
///
/// These methods internally use `tokio::task::spawn_blocking` to offload
/// synchronous table operations to a blocking thread pool.
///
/// ## Usage
///
/// ```rust,ignore
/// use tessera_storage::{TableStore, TableStoreAsync};
/// use std::sync::Arc;
///
/// async fn load(store: Arc<dyn TableStore>) {
///     let row = store.get_record_async("99", "Test").await.unwrap();
/// }
/// ```
#[async_trait::async_trait]
pub trait TableStoreAsync: Send + Sync {
    /// Async version of `create_table()`
    async fn create_table_async(&self) -> Result<()>;

    /// Async version of `delete_table()`
    async fn delete_table_async(&self) -> Result<()>;

    /// Async version of `table_exists()`
    async fn table_exists_async(&self) -> Result<bool>;

    /// Async version of `insert()`
    async fn insert_async(&self, entity: TableEntity) -> Result<()>;

    /// Async version of `insert_many()`
    async fn insert_many_async(&self, entities: Vec<TableEntity>) -> Result<()>;

    /// Async version of `insert_or_replace()`
    async fn insert_or_replace_async(&self, entity: TableEntity) -> Result<()>;

    /// Async version of `insert_or_replace_many()`
    async fn insert_or_replace_many_async(&self, entities: Vec<TableEntity>) -> Result<()>;

    /// Async version of `update()`
    async fn update_async(&self, entity: TableEntity) -> Result<()>;

    /// Async version of `delete()`
    async fn delete_async(&self, entity: TableEntity) -> Result<()>;

    /// Async version of `get_record()`
    async fn get_record_async(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>>;

    /// Async version of `get_by_partition_key()`
    async fn get_by_partition_key_async(&self, partition_key: &str) -> Result<Vec<TableEntity>>;

    /// Async version of `get_by_partition_key_paged()`
    async fn get_by_partition_key_paged_async(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> Result<PagedResult<TableEntity>>;

    /// Async version of `get_by_row_key()`
    async fn get_by_row_key_async(&self, row_key: &str) -> Result<Vec<TableEntity>>;

    /// Async version of `get_by_row_key_paged()`
    async fn get_by_row_key_paged_async(
        &self,
        row_key: &str,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> Result<PagedResult<TableEntity>>;

    /// Async version of `get_all_records()`
    async fn get_all_records_async(&self) -> Result<Vec<TableEntity>>;

    /// Async version of `get_all_records_paged()`
    async fn get_all_records_paged_async(
        &self,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> Result<PagedResult<TableEntity>>;

    /// Async version of `get_record_count()`
    async fn get_record_count_async(&self) -> Result<usize>;
}

/// Run one synchronous table call on the blocking pool
async fn run_blocking<R, F>(store: &Arc<dyn TableStore>, f: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce(&dyn TableStore) -> Result<R> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| StoreError::Backend {
            status: 500,
            message: format!("spawn_blocking join error: {}", e),
        })?
}

// Blanket implementation for Arc<dyn TableStore>
#[async_trait::async_trait]
impl TableStoreAsync for Arc<dyn TableStore> {
    async fn create_table_async(&self) -> Result<()> {
        run_blocking(self, |s| s.create_table()).await
    }

    async fn delete_table_async(&self) -> Result<()> {
        run_blocking(self, |s| s.delete_table()).await
    }

    async fn table_exists_async(&self) -> Result<bool> {
        run_blocking(self, |s| s.table_exists()).await
    }

    async fn insert_async(&self, entity: TableEntity) -> Result<()> {
        run_blocking(self, move |s| s.insert(entity)).await
    }

    async fn insert_many_async(&self, entities: Vec<TableEntity>) -> Result<()> {
        run_blocking(self, move |s| s.insert_many(entities)).await
    }

    async fn insert_or_replace_async(&self, entity: TableEntity) -> Result<()> {
        run_blocking(self, move |s| s.insert_or_replace(entity)).await
    }

    async fn insert_or_replace_many_async(&self, entities: Vec<TableEntity>) -> Result<()> {
        run_blocking(self, move |s| s.insert_or_replace_many(entities)).await
    }

    async fn update_async(&self, entity: TableEntity) -> Result<()> {
        run_blocking(self, move |s| s.update(entity)).await
    }

    async fn delete_async(&self, entity: TableEntity) -> Result<()> {
        run_blocking(self, move |s| s.delete(entity)).await
    }

    async fn get_record_async(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>> {
        let partition_key = partition_key.to_string();
        let row_key = row_key.to_string();
        run_blocking(self, move |s| s.get_record(&partition_key, &row_key)).await
    }

    async fn get_by_partition_key_async(&self, partition_key: &str) -> Result<Vec<TableEntity>> {
        let partition_key = partition_key.to_string();
        run_blocking(self, move |s| s.get_by_partition_key(&partition_key)).await
    }

    async fn get_by_partition_key_paged_async(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> Result<PagedResult<TableEntity>> {
        let partition_key = partition_key.to_string();
        run_blocking(self, move |s| {
            s.get_by_partition_key_paged(&partition_key, page_size, continuation_token.as_deref())
        })
        .await
    }

    async fn get_by_row_key_async(&self, row_key: &str) -> Result<Vec<TableEntity>> {
        let row_key = row_key.to_string();
        run_blocking(self, move |s| s.get_by_row_key(&row_key)).await
    }

    async fn get_by_row_key_paged_async(
        &self,
        row_key: &str,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> Result<PagedResult<TableEntity>> {
        let row_key = row_key.to_string();
        run_blocking(self, move |s| {
            s.get_by_row_key_paged(&row_key, page_size, continuation_token.as_deref())
        })
        .await
    }

    async fn get_all_records_async(&self) -> Result<Vec<TableEntity>> {
        run_blocking(self, |s| s.get_all_records()).await
    }

    async fn get_all_records_paged_async(
        &self,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> Result<PagedResult<TableEntity>> {
        run_blocking(self, move |s| {
            s.get_all_records_paged(page_size, continuation_token.as_deref())
        })
        .await
    }

    async fn get_record_count_async(&self) -> Result<usize> {
        run_blocking(self, |s| s.get_record_count()).await
    }
}
