//! Typed table store
//!
//! [`TypedTableStore`] stores records of type `T` in one table, using a
//! [`KeysConverter`] to map records to rows. Typed keys (`PK`, `RK`) are
//! accepted by the lookup methods; the `_raw` variants take the stored key
//! strings directly.
//!
//! Every mutation raises an event on [`StoreEvents`] after the table write
//! succeeds. Sync methods notify sync handlers, async methods notify async
//! handlers, and a handler error is returned from the mutation.

use crate::converter::KeysConverter;
use crate::events::StoreEvents;
use crate::options::TypedStoreOptions;
use std::sync::Arc;
use tessera_core::{ETag, PagedResult, Result, TableEntity};
use tessera_storage::{MemoryTableService, TableStore, TableStoreAsync};
use tracing::debug;

/// Records of type `T` in one table
pub struct TypedTableStore<T, PK = String, RK = String> {
    table: Arc<dyn TableStore>,
    converter: Arc<dyn KeysConverter<T, PK, RK>>,
    ignored_properties: Vec<String>,
    events: StoreEvents<T>,
}

impl<T, PK, RK> TypedTableStore<T, PK, RK>
where
    T: Clone + Send + Sync + 'static,
    PK: Send + Sync + 'static,
    RK: Send + Sync + 'static,
{
    /// Wrap an existing table
    ///
    /// Creates the table if `options.table_storage.ensure_table_exists` is set.
    pub fn new(
        table: Arc<dyn TableStore>,
        converter: impl KeysConverter<T, PK, RK> + 'static,
        options: TypedStoreOptions,
    ) -> Result<Self> {
        if options.table_storage.ensure_table_exists {
            table.create_table()?;
        }
        Ok(Self {
            table,
            converter: Arc::new(converter),
            ignored_properties: options.ignored_properties,
            events: StoreEvents::new(),
        })
    }

    /// Open a table of an in-memory service
    pub fn open(
        service: &Arc<MemoryTableService>,
        table_name: &str,
        converter: impl KeysConverter<T, PK, RK> + 'static,
        options: TypedStoreOptions,
    ) -> Result<Self> {
        let table = service.open_table(table_name, options.table_storage.clone())?;
        Self::new(table, converter, options)
    }

    /// Name of the underlying table
    pub fn table_name(&self) -> &str {
        self.table.table_name()
    }

    /// The underlying untyped table
    pub fn table(&self) -> &Arc<dyn TableStore> {
        &self.table
    }

    /// Event subscriptions for this store
    pub fn events(&self) -> &StoreEvents<T> {
        &self.events
    }

    /// Stored partition key for a typed key
    pub fn partition_key(&self, key: &PK) -> String {
        self.converter.partition_key(key)
    }

    /// Stored row key for a typed key
    pub fn row_key(&self, key: &RK) -> String {
        self.converter.row_key(key)
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    fn create_entity(&self, record: &T) -> Result<TableEntity> {
        let mut entity = self.converter.to_entity(record)?;
        for property in &self.ignored_properties {
            entity.properties.remove(property);
        }
        Ok(entity)
    }

    /// Row carrying the stored etag, or the wildcard if the row is missing
    fn create_entity_with_etag(&self, record: &T) -> Result<TableEntity> {
        let entity = self.create_entity(record)?;
        let etag = self
            .table
            .get_record(&entity.partition_key, &entity.row_key)?
            .and_then(|stored| stored.etag)
            .unwrap_or_else(ETag::wildcard);
        Ok(entity.with_etag(etag))
    }

    async fn create_entity_with_etag_async(&self, record: &T) -> Result<TableEntity> {
        let entity = self.create_entity(record)?;
        let etag = self
            .table
            .get_record_async(&entity.partition_key, &entity.row_key)
            .await?
            .and_then(|stored| stored.etag)
            .unwrap_or_else(ETag::wildcard);
        Ok(entity.with_etag(etag))
    }

    fn create_records(&self, entities: Vec<TableEntity>) -> Result<Vec<T>> {
        entities
            .into_iter()
            .map(|e| self.converter.from_entity(e))
            .collect()
    }

    fn create_paged(&self, page: PagedResult<TableEntity>) -> Result<PagedResult<T>> {
        page.try_map(|e| self.converter.from_entity(e))
    }

    // ========================================================================
    // Table lifecycle
    // ========================================================================

    /// Create the table and raise `table_created`
    pub fn create_table(&self) -> Result<()> {
        self.table.create_table()?;
        debug!(table = %self.table_name(), "Typed store table created");
        self.events.table_created().emit(&self.table_name().to_string())
    }

    /// Delete the table and raise `table_deleted`
    pub fn delete_table(&self) -> Result<()> {
        self.table.delete_table()?;
        debug!(table = %self.table_name(), "Typed store table deleted");
        self.events.table_deleted().emit(&self.table_name().to_string())
    }

    /// Check if the table exists
    pub fn table_exists(&self) -> Result<bool> {
        self.table.table_exists()
    }

    /// Async version of `create_table()`
    pub async fn create_table_async(&self) -> Result<()> {
        self.table.create_table_async().await?;
        self.events
            .table_created()
            .emit_async(&self.table_name().to_string())
            .await
    }

    /// Async version of `delete_table()`
    pub async fn delete_table_async(&self) -> Result<()> {
        self.table.delete_table_async().await?;
        self.events
            .table_deleted()
            .emit_async(&self.table_name().to_string())
            .await
    }

    /// Async version of `table_exists()`
    pub async fn table_exists_async(&self) -> Result<bool> {
        self.table.table_exists_async().await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a new record
    pub fn insert(&self, record: &T) -> Result<()> {
        self.table.insert(self.create_entity(record)?)?;
        self.events.inserted_or_updated().emit(record)
    }

    /// Insert several new records in one batch
    pub fn insert_many(&self, records: &[T]) -> Result<()> {
        let entities = records
            .iter()
            .map(|r| self.create_entity(r))
            .collect::<Result<Vec<_>>>()?;
        self.table.insert_many(entities)?;
        self.events.many_inserted().emit(&records.to_vec())
    }

    /// Insert a record, replacing any record with the same keys
    pub fn insert_or_replace(&self, record: &T) -> Result<()> {
        self.table.insert_or_replace(self.create_entity(record)?)?;
        self.events.inserted_or_updated().emit(record)
    }

    /// Insert or replace several records in one batch
    ///
    /// Raises `many_inserted` once the whole batch is written.
    pub fn insert_or_replace_many(&self, records: &[T]) -> Result<()> {
        let entities = records
            .iter()
            .map(|r| self.create_entity(r))
            .collect::<Result<Vec<_>>>()?;
        self.table.insert_or_replace_many(entities)?;
        self.events.many_inserted().emit(&records.to_vec())
    }

    /// Replace an existing record
    pub fn update(&self, record: &T) -> Result<()> {
        self.table.update(self.create_entity_with_etag(record)?)?;
        self.events.inserted_or_updated().emit(record)
    }

    /// Replace an existing record regardless of its etag
    pub fn update_using_wildcard_etag(&self, record: &T) -> Result<()> {
        let entity = self.create_entity(record)?.with_etag(ETag::wildcard());
        self.table.update(entity)?;
        self.events.inserted_or_updated().emit(record)
    }

    /// Delete an existing record
    pub fn delete(&self, record: &T) -> Result<()> {
        self.table.delete(self.create_entity_with_etag(record)?)?;
        self.events.deleted().emit(record)
    }

    /// Delete an existing record regardless of its etag
    pub fn delete_using_wildcard_etag(&self, record: &T) -> Result<()> {
        let entity = self.create_entity(record)?.with_etag(ETag::wildcard());
        self.table.delete(entity)?;
        self.events.deleted().emit(record)
    }

    /// Async version of `insert()`
    pub async fn insert_async(&self, record: &T) -> Result<()> {
        self.table.insert_async(self.create_entity(record)?).await?;
        self.events.inserted_or_updated().emit_async(record).await
    }

    /// Async version of `insert_many()`
    pub async fn insert_many_async(&self, records: &[T]) -> Result<()> {
        let entities = records
            .iter()
            .map(|r| self.create_entity(r))
            .collect::<Result<Vec<_>>>()?;
        self.table.insert_many_async(entities).await?;
        self.events.many_inserted().emit_async(&records.to_vec()).await
    }

    /// Async version of `insert_or_replace()`
    pub async fn insert_or_replace_async(&self, record: &T) -> Result<()> {
        self.table
            .insert_or_replace_async(self.create_entity(record)?)
            .await?;
        self.events.inserted_or_updated().emit_async(record).await
    }

    /// Async version of `insert_or_replace_many()`
    pub async fn insert_or_replace_many_async(&self, records: &[T]) -> Result<()> {
        let entities = records
            .iter()
            .map(|r| self.create_entity(r))
            .collect::<Result<Vec<_>>>()?;
        self.table.insert_or_replace_many_async(entities).await?;
        self.events.many_inserted().emit_async(&records.to_vec()).await
    }

    /// Async version of `update()`
    pub async fn update_async(&self, record: &T) -> Result<()> {
        let entity = self.create_entity_with_etag_async(record).await?;
        self.table.update_async(entity).await?;
        self.events.inserted_or_updated().emit_async(record).await
    }

    /// Async version of `update_using_wildcard_etag()`
    pub async fn update_using_wildcard_etag_async(&self, record: &T) -> Result<()> {
        let entity = self.create_entity(record)?.with_etag(ETag::wildcard());
        self.table.update_async(entity).await?;
        self.events.inserted_or_updated().emit_async(record).await
    }

    /// Async version of `delete()`
    pub async fn delete_async(&self, record: &T) -> Result<()> {
        let entity = self.create_entity_with_etag_async(record).await?;
        self.table.delete_async(entity).await?;
        self.events.deleted().emit_async(record).await
    }

    /// Async version of `delete_using_wildcard_etag()`
    pub async fn delete_using_wildcard_etag_async(&self, record: &T) -> Result<()> {
        let entity = self.create_entity(record)?.with_etag(ETag::wildcard());
        self.table.delete_async(entity).await?;
        self.events.deleted().emit_async(record).await
    }

    // ========================================================================
    // Point reads
    // ========================================================================

    /// Record by typed keys
    pub fn get_record(&self, partition_key: &PK, row_key: &RK) -> Result<Option<T>> {
        self.get_record_raw(&self.partition_key(partition_key), &self.row_key(row_key))
    }

    /// Record by stored key strings
    pub fn get_record_raw(&self, partition_key: &str, row_key: &str) -> Result<Option<T>> {
        self.table
            .get_record(partition_key, row_key)?
            .map(|e| self.converter.from_entity(e))
            .transpose()
    }

    /// Async version of `get_record()`
    pub async fn get_record_async(&self, partition_key: &PK, row_key: &RK) -> Result<Option<T>> {
        let partition_key = self.partition_key(partition_key);
        let row_key = self.row_key(row_key);
        self.get_record_raw_async(&partition_key, &row_key).await
    }

    /// Async version of `get_record_raw()`
    pub async fn get_record_raw_async(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<T>> {
        self.table
            .get_record_async(partition_key, row_key)
            .await?
            .map(|e| self.converter.from_entity(e))
            .transpose()
    }

    // ========================================================================
    // Partition scans
    // ========================================================================

    /// All records of a partition
    pub fn get_by_partition_key(&self, partition_key: &PK) -> Result<Vec<T>> {
        self.get_by_partition_key_raw(&self.partition_key(partition_key))
    }

    /// All records of a partition, by stored key
    pub fn get_by_partition_key_raw(&self, partition_key: &str) -> Result<Vec<T>> {
        self.create_records(self.table.get_by_partition_key(partition_key)?)
    }

    /// Records of a partition that pass `filter`
    ///
    /// The filter runs after the scan.
    pub fn get_by_partition_key_with_filter(
        &self,
        partition_key: &PK,
        filter: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let mut records = self.get_by_partition_key(partition_key)?;
        records.retain(|r| filter(r));
        Ok(records)
    }

    /// One page of a partition scan
    pub fn get_by_partition_key_paged(
        &self,
        partition_key: &PK,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        self.get_by_partition_key_paged_raw(
            &self.partition_key(partition_key),
            page_size,
            continuation_token,
        )
    }

    /// One page of a partition scan, by stored key
    pub fn get_by_partition_key_paged_raw(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let page = self
            .table
            .get_by_partition_key_paged(partition_key, page_size, continuation_token)?;
        self.create_paged(page)
    }

    /// Async version of `get_by_partition_key()`
    pub async fn get_by_partition_key_async(&self, partition_key: &PK) -> Result<Vec<T>> {
        let partition_key = self.partition_key(partition_key);
        self.get_by_partition_key_raw_async(&partition_key).await
    }

    /// Async version of `get_by_partition_key_raw()`
    pub async fn get_by_partition_key_raw_async(&self, partition_key: &str) -> Result<Vec<T>> {
        let entities = self.table.get_by_partition_key_async(partition_key).await?;
        self.create_records(entities)
    }

    /// Async version of `get_by_partition_key_with_filter()`
    pub async fn get_by_partition_key_with_filter_async(
        &self,
        partition_key: &PK,
        filter: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let mut records = self.get_by_partition_key_async(partition_key).await?;
        records.retain(|r| filter(r));
        Ok(records)
    }

    /// Async version of `get_by_partition_key_paged()`
    pub async fn get_by_partition_key_paged_async(
        &self,
        partition_key: &PK,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let partition_key = self.partition_key(partition_key);
        self.get_by_partition_key_paged_raw_async(&partition_key, page_size, continuation_token)
            .await
    }

    /// Async version of `get_by_partition_key_paged_raw()`
    pub async fn get_by_partition_key_paged_raw_async(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let page = self
            .table
            .get_by_partition_key_paged_async(
                partition_key,
                page_size,
                continuation_token.map(str::to_string),
            )
            .await?;
        self.create_paged(page)
    }

    // ========================================================================
    // Row key scans
    // ========================================================================

    /// All records with a row key, across partitions
    ///
    /// Scans the whole table; prefer partition scans.
    pub fn get_by_row_key(&self, row_key: &RK) -> Result<Vec<T>> {
        self.get_by_row_key_raw(&self.row_key(row_key))
    }

    /// All records with a stored row key
    pub fn get_by_row_key_raw(&self, row_key: &str) -> Result<Vec<T>> {
        self.create_records(self.table.get_by_row_key(row_key)?)
    }

    /// Records with a row key that pass `filter`
    pub fn get_by_row_key_with_filter(
        &self,
        row_key: &RK,
        filter: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let mut records = self.get_by_row_key(row_key)?;
        records.retain(|r| filter(r));
        Ok(records)
    }

    /// One page of a row key scan
    pub fn get_by_row_key_paged(
        &self,
        row_key: &RK,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        self.get_by_row_key_paged_raw(&self.row_key(row_key), page_size, continuation_token)
    }

    /// One page of a row key scan, by stored key
    pub fn get_by_row_key_paged_raw(
        &self,
        row_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let page = self
            .table
            .get_by_row_key_paged(row_key, page_size, continuation_token)?;
        self.create_paged(page)
    }

    /// Async version of `get_by_row_key()`
    pub async fn get_by_row_key_async(&self, row_key: &RK) -> Result<Vec<T>> {
        let row_key = self.row_key(row_key);
        self.get_by_row_key_raw_async(&row_key).await
    }

    /// Async version of `get_by_row_key_raw()`
    pub async fn get_by_row_key_raw_async(&self, row_key: &str) -> Result<Vec<T>> {
        let entities = self.table.get_by_row_key_async(row_key).await?;
        self.create_records(entities)
    }

    /// Async version of `get_by_row_key_paged()`
    pub async fn get_by_row_key_paged_async(
        &self,
        row_key: &RK,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let row_key = self.row_key(row_key);
        let page = self
            .table
            .get_by_row_key_paged_async(&row_key, page_size, continuation_token.map(str::to_string))
            .await?;
        self.create_paged(page)
    }

    // ========================================================================
    // Table scans
    // ========================================================================

    /// Every record in the table
    pub fn get_all_records(&self) -> Result<Vec<T>> {
        self.create_records(self.table.get_all_records()?)
    }

    /// One page of a full table scan
    pub fn get_all_records_paged(
        &self,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        self.create_paged(self.table.get_all_records_paged(page_size, continuation_token)?)
    }

    /// Number of records in the table
    pub fn get_record_count(&self) -> Result<usize> {
        self.table.get_record_count()
    }

    /// Every record that passes `filter`
    ///
    /// The filter runs after a full table scan.
    pub fn get_records_by_filter(&self, filter: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        let mut records = self.get_all_records()?;
        records.retain(|r| filter(r));
        Ok(records)
    }

    /// Records that pass `filter`, skipping `start` and keeping at most `page_size`
    pub fn get_records_by_filter_paged(
        &self,
        filter: impl Fn(&T) -> bool,
        start: usize,
        page_size: usize,
    ) -> Result<Vec<T>> {
        Ok(self
            .get_records_by_filter(filter)?
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect())
    }

    /// Async version of `get_all_records()`
    pub async fn get_all_records_async(&self) -> Result<Vec<T>> {
        let entities = self.table.get_all_records_async().await?;
        self.create_records(entities)
    }

    /// Async version of `get_all_records_paged()`
    pub async fn get_all_records_paged_async(
        &self,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<T>> {
        let page = self
            .table
            .get_all_records_paged_async(page_size, continuation_token.map(str::to_string))
            .await?;
        self.create_paged(page)
    }

    /// Async version of `get_record_count()`
    pub async fn get_record_count_async(&self) -> Result<usize> {
        self.table.get_record_count_async().await
    }

    /// Async version of `get_records_by_filter()`
    pub async fn get_records_by_filter_async(
        &self,
        filter: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let mut records = self.get_all_records_async().await?;
        records.retain(|r| filter(r));
        Ok(records)
    }

    /// Async version of `get_records_by_filter_paged()`
    pub async fn get_records_by_filter_paged_async(
        &self,
        filter: impl Fn(&T) -> bool,
        start: usize,
        page_size: usize,
    ) -> Result<Vec<T>> {
        Ok(self
            .get_records_by_filter_async(filter)
            .await?
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect())
    }
}
