//! Index store abstraction
//!
//! [`IndexStore`] is the record-typed surface the engine drives. It hides
//! the index's own key types, so indexes with different key mappings over
//! the same record type can share one registry. [`TypedTableStore`] is the
//! implementation used in practice.

use async_trait::async_trait;
use tessera_core::{PagedResult, Result};
use tessera_typed::TypedTableStore;

/// A secondary index holding records of type `T`
#[async_trait]
pub trait IndexStore<T>: Send + Sync {
    /// Name of the index table
    fn table_name(&self) -> &str;

    /// Insert or replace a record
    fn upsert(&self, record: &T) -> Result<()>;

    /// Insert or replace several records in one atomic batch
    fn upsert_many(&self, records: &[T]) -> Result<()>;

    /// Delete a record; fails with a not-found error if it is absent
    fn delete(&self, record: &T) -> Result<()>;

    /// Create the index table
    fn create_table(&self) -> Result<()>;

    /// Delete the index table
    fn delete_table(&self) -> Result<()>;

    /// Record by index keys
    fn get_record(&self, partition_key: &str, row_key: &str) -> Result<Option<T>>;

    /// All records under an index partition key
    fn get_by_partition_key(&self, partition_key: &str) -> Result<Vec<T>>;

    /// One page of records under an index partition key
    fn get_by_partition_key_paged(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>>;

    /// Async version of `upsert()`
    async fn upsert_async(&self, record: &T) -> Result<()>;

    /// Async version of `upsert_many()`
    async fn upsert_many_async(&self, records: &[T]) -> Result<()>;

    /// Async version of `delete()`
    async fn delete_async(&self, record: &T) -> Result<()>;

    /// Async version of `create_table()`
    async fn create_table_async(&self) -> Result<()>;

    /// Async version of `delete_table()`
    async fn delete_table_async(&self) -> Result<()>;

    /// Async version of `get_record()`
    async fn get_record_async(&self, partition_key: &str, row_key: &str) -> Result<Option<T>>;

    /// Async version of `get_by_partition_key()`
    async fn get_by_partition_key_async(&self, partition_key: &str) -> Result<Vec<T>>;

    /// Async version of `get_by_partition_key_paged()`
    async fn get_by_partition_key_paged_async(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>>;
}

#[async_trait]
impl<T, PK, RK> IndexStore<T> for TypedTableStore<T, PK, RK>
where
    T: Clone + Send + Sync + 'static,
    PK: Send + Sync + 'static,
    RK: Send + Sync + 'static,
{
    fn table_name(&self) -> &str {
        TypedTableStore::table_name(self)
    }

    fn upsert(&self, record: &T) -> Result<()> {
        self.insert_or_replace(record)
    }

    fn upsert_many(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.insert_or_replace_many(records)
    }

    fn delete(&self, record: &T) -> Result<()> {
        self.delete_using_wildcard_etag(record)
    }

    fn create_table(&self) -> Result<()> {
        TypedTableStore::create_table(self)
    }

    fn delete_table(&self) -> Result<()> {
        TypedTableStore::delete_table(self)
    }

    fn get_record(&self, partition_key: &str, row_key: &str) -> Result<Option<T>> {
        self.get_record_raw(partition_key, row_key)
    }

    fn get_by_partition_key(&self, partition_key: &str) -> Result<Vec<T>> {
        self.get_by_partition_key_raw(partition_key)
    }

    fn get_by_partition_key_paged(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        self.get_by_partition_key_paged_raw(partition_key, page_size, continuation_token)
    }

    async fn upsert_async(&self, record: &T) -> Result<()> {
        self.insert_or_replace_async(record).await
    }

    async fn upsert_many_async(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.insert_or_replace_many_async(records).await
    }

    async fn delete_async(&self, record: &T) -> Result<()> {
        self.delete_using_wildcard_etag_async(record).await
    }

    async fn create_table_async(&self) -> Result<()> {
        TypedTableStore::create_table_async(self).await
    }

    async fn delete_table_async(&self) -> Result<()> {
        TypedTableStore::delete_table_async(self).await
    }

    async fn get_record_async(&self, partition_key: &str, row_key: &str) -> Result<Option<T>> {
        self.get_record_raw_async(partition_key, row_key).await
    }

    async fn get_by_partition_key_async(&self, partition_key: &str) -> Result<Vec<T>> {
        self.get_by_partition_key_raw_async(partition_key).await
    }

    async fn get_by_partition_key_paged_async(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        self.get_by_partition_key_paged_raw_async(partition_key, page_size, continuation_token)
            .await
    }
}
