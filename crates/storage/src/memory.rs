//! In-memory table service
//!
//! A process-local stand-in for a cloud table service. Every table is a
//! `BTreeMap` keyed by (partition key, row key) so scans come back in
//! service order and continuation tokens are stable.
//!
//! # Design
//!
//! - DashMap: tables sharded by name, lookups never block each other
//! - RwLock per table: concurrent readers, one writer per table
//! - AtomicU64: service-wide version counter used for etags
//!
//! # Thread Safety
//!
//! All operations are thread-safe. Operations on different tables never
//! contend; the table map lock is released before a table lock is taken.
//!
//! # Example
//!
//! ```ignore
//! use tessera_storage::{MemoryTableService, TableStorageOptions, TableStore};
//! use std::sync::Arc;
//!
//! let service = Arc::new(MemoryTableService::new());
//! let employees = service.open_table("Employees", TableStorageOptions::default())?;
//! assert!(employees.table_exists()?);
//! ```

use crate::options::TableStorageOptions;
use crate::traits::{TableStore, MAX_PAGE_SIZE};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_core::{
    ContinuationToken, ETag, EntityKey, PagedResult, Result, StoreError, TableEntity,
};
use tracing::debug;

/// Longest key the service accepts, in bytes
const MAX_KEY_LEN: usize = 1024;

/// Rows of one table, in scan order
#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<EntityKey, TableEntity>,
}

/// An account holding any number of named tables
pub struct MemoryTableService {
    /// Tables by name
    tables: DashMap<String, Arc<RwLock<Table>>>,
    /// Global version for etags
    version: AtomicU64,
}

impl MemoryTableService {
    /// Create an empty service
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    /// Open a store bound to one table
    ///
    /// With `ensure_table_exists` set the table is created if missing.
    pub fn open_table(
        self: &Arc<Self>,
        name: &str,
        options: TableStorageOptions,
    ) -> Result<Arc<MemoryTableStore>> {
        validate_table_name(name)?;
        let store = Arc::new(MemoryTableStore {
            service: Arc::clone(self),
            name: name.to_string(),
        });
        if options.ensure_table_exists {
            store.create_table()?;
        }
        Ok(store)
    }

    /// Names of all existing tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of existing tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Increment version and return the etag for it
    #[inline]
    fn next_etag(&self) -> ETag {
        ETag::from_version(self.version.fetch_add(1, Ordering::AcqRel) + 1)
    }

    fn table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .get(name)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    /// Assign etag and timestamp to a row about to be written
    fn stamp(&self, mut entity: TableEntity) -> TableEntity {
        entity.etag = Some(self.next_etag());
        entity.timestamp = Some(Utc::now());
        entity
    }
}

impl Default for MemoryTableService {
    fn default() -> Self {
        Self::new()
    }
}

/// A store bound to one table of a [`MemoryTableService`]
pub struct MemoryTableStore {
    service: Arc<MemoryTableService>,
    name: String,
}

impl MemoryTableStore {
    /// The service this store belongs to
    pub fn service(&self) -> &Arc<MemoryTableService> {
        &self.service
    }

    fn table(&self) -> Result<Arc<RwLock<Table>>> {
        self.service.table(&self.name)
    }

    fn not_found(&self, key: &EntityKey) -> StoreError {
        StoreError::EntityNotFound {
            table: self.name.clone(),
            partition_key: key.partition_key.clone(),
            row_key: key.row_key.clone(),
        }
    }

    fn already_exists(&self, key: &EntityKey) -> StoreError {
        StoreError::EntityAlreadyExists {
            table: self.name.clone(),
            partition_key: key.partition_key.clone(),
            row_key: key.row_key.clone(),
        }
    }

    /// Check the caller's etag against the stored row
    fn check_etag(supplied: Option<&ETag>, stored: &TableEntity) -> Result<()> {
        match (supplied, stored.etag.as_ref()) {
            (Some(supplied), Some(actual)) if !supplied.matches(actual) => {
                Err(StoreError::PreconditionFailed {
                    expected: supplied.to_string(),
                    actual: actual.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl TableStore for MemoryTableStore {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn create_table(&self) -> Result<()> {
        self.service
            .tables
            .entry(self.name.clone())
            .or_insert_with(|| {
                debug!(table = %self.name, "Created table");
                Arc::new(RwLock::new(Table::default()))
            });
        Ok(())
    }

    fn delete_table(&self) -> Result<()> {
        if self.service.tables.remove(&self.name).is_some() {
            debug!(table = %self.name, "Deleted table");
        }
        Ok(())
    }

    fn table_exists(&self) -> Result<bool> {
        Ok(self.service.tables.contains_key(&self.name))
    }

    fn insert(&self, entity: TableEntity) -> Result<()> {
        validate_entity_keys(&entity)?;
        let table = self.table()?;
        let mut table = table.write();
        let key = entity.key();
        if table.rows.contains_key(&key) {
            return Err(self.already_exists(&key));
        }
        table.rows.insert(key, self.service.stamp(entity));
        Ok(())
    }

    fn insert_many(&self, entities: Vec<TableEntity>) -> Result<()> {
        for entity in &entities {
            validate_entity_keys(entity)?;
        }
        let table = self.table()?;
        let mut table = table.write();

        // Check every key before writing any row
        let mut seen = std::collections::BTreeSet::new();
        for entity in &entities {
            let key = entity.key();
            if table.rows.contains_key(&key) || !seen.insert(key.clone()) {
                return Err(self.already_exists(&key));
            }
        }

        for entity in entities {
            table.rows.insert(entity.key(), self.service.stamp(entity));
        }
        Ok(())
    }

    fn insert_or_replace(&self, entity: TableEntity) -> Result<()> {
        validate_entity_keys(&entity)?;
        let table = self.table()?;
        let mut table = table.write();
        table.rows.insert(entity.key(), self.service.stamp(entity));
        Ok(())
    }

    fn insert_or_replace_many(&self, entities: Vec<TableEntity>) -> Result<()> {
        for entity in &entities {
            validate_entity_keys(entity)?;
        }
        let table = self.table()?;
        let mut table = table.write();
        for entity in entities {
            table.rows.insert(entity.key(), self.service.stamp(entity));
        }
        Ok(())
    }

    fn update(&self, entity: TableEntity) -> Result<()> {
        validate_entity_keys(&entity)?;
        let table = self.table()?;
        let mut table = table.write();
        let key = entity.key();
        let stored = table.rows.get(&key).ok_or_else(|| self.not_found(&key))?;
        Self::check_etag(entity.etag.as_ref(), stored)?;
        table.rows.insert(key, self.service.stamp(entity));
        Ok(())
    }

    fn delete(&self, entity: TableEntity) -> Result<()> {
        let table = self.table()?;
        let mut table = table.write();
        let key = entity.key();
        let stored = table.rows.get(&key).ok_or_else(|| self.not_found(&key))?;
        Self::check_etag(entity.etag.as_ref(), stored)?;
        table.rows.remove(&key);
        Ok(())
    }

    fn get_record(&self, partition_key: &str, row_key: &str) -> Result<Option<TableEntity>> {
        let table = self.table()?;
        let table = table.read();
        Ok(table.rows.get(&EntityKey::new(partition_key, row_key)).cloned())
    }

    fn get_by_partition_key(&self, partition_key: &str) -> Result<Vec<TableEntity>> {
        let table = self.table()?;
        let table = table.read();
        Ok(partition_range(&table, partition_key, None)
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn get_by_partition_key_paged(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<TableEntity>> {
        let resume = decode_token(continuation_token)?;
        let table = self.table()?;
        let table = table.read();
        page(partition_range(&table, partition_key, resume.as_ref()), page_size)
    }

    fn get_by_row_key(&self, row_key: &str) -> Result<Vec<TableEntity>> {
        let table = self.table()?;
        let table = table.read();
        Ok(table
            .rows
            .values()
            .filter(|e| e.row_key == row_key)
            .cloned()
            .collect())
    }

    fn get_by_row_key_paged(
        &self,
        row_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<TableEntity>> {
        let resume = decode_token(continuation_token)?;
        let table = self.table()?;
        let table = table.read();
        let rows = full_range(&table, resume.as_ref()).filter(|(k, _)| k.row_key == row_key);
        page(rows, page_size)
    }

    fn get_all_records(&self) -> Result<Vec<TableEntity>> {
        let table = self.table()?;
        let table = table.read();
        Ok(table.rows.values().cloned().collect())
    }

    fn get_all_records_paged(
        &self,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> Result<PagedResult<TableEntity>> {
        let resume = decode_token(continuation_token)?;
        let table = self.table()?;
        let table = table.read();
        page(full_range(&table, resume.as_ref()), page_size)
    }

    fn get_record_count(&self) -> Result<usize> {
        let table = self.table()?;
        let count = table.read().rows.len();
        Ok(count)
    }
}

// ============================================================================
// Scan helpers
// ============================================================================

fn decode_token(token: Option<&str>) -> Result<Option<EntityKey>> {
    token
        .map(|t| ContinuationToken::decode(t).map(|t| t.key()))
        .transpose()
}

/// Rows from `resume` (inclusive) to the end of the table
fn full_range<'a>(
    table: &'a Table,
    resume: Option<&EntityKey>,
) -> impl Iterator<Item = (&'a EntityKey, &'a TableEntity)> + 'a {
    let start = match resume {
        Some(key) => Bound::Included(key.clone()),
        None => Bound::Unbounded,
    };
    table.rows.range((start, Bound::Unbounded))
}

/// Rows of one partition, starting at `resume` if it lies inside it
fn partition_range<'a>(
    table: &'a Table,
    partition_key: &'a str,
    resume: Option<&EntityKey>,
) -> impl Iterator<Item = (&'a EntityKey, &'a TableEntity)> + 'a {
    let first = EntityKey::new(partition_key, "");
    let start = match resume {
        Some(key) if *key > first => key.clone(),
        _ => first,
    };
    table
        .rows
        .range((Bound::Included(start), Bound::Unbounded))
        .take_while(move |(k, _)| k.partition_key == partition_key)
}

/// Cut one page off a scan and compute the token for the rest
fn page<'a>(
    rows: impl Iterator<Item = (&'a EntityKey, &'a TableEntity)>,
    page_size: usize,
) -> Result<PagedResult<TableEntity>> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut items = Vec::with_capacity(page_size);
    let mut next = None;
    for (key, entity) in rows {
        if items.len() == page_size {
            next = Some(ContinuationToken::at(key).encode()?);
            break;
        }
        items.push(entity.clone());
    }
    Ok(PagedResult::new(items, next))
}

// ============================================================================
// Validation
// ============================================================================

/// Table names: 3-63 ASCII alphanumerics, starting with a letter
fn validate_table_name(name: &str) -> Result<()> {
    let valid = (3..=63).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric())
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!("invalid table name: {:?}", name)))
    }
}

/// Keys may not contain `/`, `\`, `#`, `?` or control characters
fn validate_key(kind: &str, key: &str) -> Result<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidKey(format!(
            "{} longer than {} bytes",
            kind, MAX_KEY_LEN
        )));
    }
    if let Some(c) = key
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '#' | '?') || c.is_control())
    {
        return Err(StoreError::InvalidKey(format!(
            "{} {:?} contains forbidden character {:?}",
            kind, key, c
        )));
    }
    Ok(())
}

fn validate_entity_keys(entity: &TableEntity) -> Result<()> {
    validate_key("partition key", &entity.partition_key)?;
    validate_key("row key", &entity.row_key)
}
