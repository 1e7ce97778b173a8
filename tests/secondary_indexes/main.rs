//! Secondary Index Integration Tests
//!
//! End-to-end tests through the `Tessera` facade: attaching indexes, write
//! propagation, conditional membership, lookups and reindexing.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all index tests
//! cargo test --test secondary_indexes
//!
//! # Run reindex tests only
//! cargo test --test secondary_indexes reindex::
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tessera::tessera_core::Result as StoreResult;
use tessera::{
    MemoryTableStore, PagedResult, SimpleKeysConverter, StoreError, TableEntity, TableStore,
    Tessera, TypedStoreOptions, TypedTableStore,
};

// Test modules
mod conditional;
mod lookups;
mod registry;
mod reindex;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub company_id: i64,
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub department: Option<String>,
}

pub fn employee(company_id: i64, id: i64, name: &str) -> Employee {
    Employee {
        company_id,
        id,
        name: name.to_string(),
        is_active: true,
        department: None,
    }
}

pub fn inactive(company_id: i64, id: i64, name: &str) -> Employee {
    Employee {
        is_active: false,
        ..employee(company_id, id, name)
    }
}

pub type Primary = Arc<TypedTableStore<Employee, i64, i64>>;
pub type ByName = Arc<TypedTableStore<Employee, i64, String>>;

/// Route library logs to the test writer, once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Create an in-memory instance with a private registry
pub fn create_db() -> Tessera {
    init_tracing();
    Tessera::ephemeral()
}

/// Employees keyed by (company_id, id)
pub fn employees(db: &Tessera) -> Primary {
    db.simple_store("Employees", "company_id", "id")
        .expect("Failed to open primary store")
}

/// Employees keyed by (company_id, name)
pub fn by_name(db: &Tessera, table: &str) -> ByName {
    db.simple_store(table, "company_id", "name")
        .expect("Failed to open index store")
}

/// An index store on top of a fault-injecting table
pub fn faulty_by_name(db: &Tessera, table: &str, faults: Faults) -> (ByName, Arc<FaultyTable>) {
    let inner = db.table(table).expect("Failed to open table");
    let faulty = Arc::new(FaultyTable::new(inner, faults));
    let store = TypedTableStore::new(
        Arc::clone(&faulty) as Arc<dyn TableStore>,
        SimpleKeysConverter::new("company_id", "name"),
        TypedStoreOptions::default(),
    )
    .expect("Failed to wrap faulty table");
    (Arc::new(store), faulty)
}

// =============================================================================
// FAULT INJECTION
// =============================================================================

/// Faults applied to writes
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Sleep before every write
    pub delay: Option<Duration>,
    /// Row keys whose writes fail with a backend error
    pub failing_row_keys: HashSet<String>,
}

impl Faults {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing(row_keys: &[&str]) -> Self {
        Self {
            failing_row_keys: row_keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Table wrapper that delays or fails writes and tracks write concurrency
pub struct FaultyTable {
    inner: Arc<MemoryTableStore>,
    faults: Faults,
    active: AtomicUsize,
    peak: AtomicUsize,
    writes: Mutex<Vec<String>>,
}

impl FaultyTable {
    pub fn new(inner: Arc<MemoryTableStore>, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Most writes observed in flight at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Row keys of attempted writes, in arrival order
    pub fn attempted_writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    fn write(
        &self,
        entity: TableEntity,
        f: impl FnOnce(TableEntity) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.writes.lock().push(entity.row_key.clone());

        if let Some(delay) = self.faults.delay {
            std::thread::sleep(delay);
        }
        let result = if self.faults.failing_row_keys.contains(&entity.row_key) {
            Err(StoreError::Backend {
                status: 503,
                message: format!("injected failure for {}", entity.row_key),
            })
        } else {
            f(entity)
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl TableStore for FaultyTable {
    fn table_name(&self) -> &str {
        self.inner.table_name()
    }

    fn create_table(&self) -> StoreResult<()> {
        self.inner.create_table()
    }

    fn delete_table(&self) -> StoreResult<()> {
        self.inner.delete_table()
    }

    fn table_exists(&self) -> StoreResult<bool> {
        self.inner.table_exists()
    }

    fn insert(&self, entity: TableEntity) -> StoreResult<()> {
        self.write(entity, |e| self.inner.insert(e))
    }

    fn insert_many(&self, entities: Vec<TableEntity>) -> StoreResult<()> {
        self.inner.insert_many(entities)
    }

    fn insert_or_replace(&self, entity: TableEntity) -> StoreResult<()> {
        self.write(entity, |e| self.inner.insert_or_replace(e))
    }

    fn insert_or_replace_many(&self, entities: Vec<TableEntity>) -> StoreResult<()> {
        self.writes
            .lock()
            .extend(entities.iter().map(|e| e.row_key.clone()));
        if let Some(bad) = entities
            .iter()
            .find(|e| self.faults.failing_row_keys.contains(&e.row_key))
        {
            return Err(StoreError::Backend {
                status: 503,
                message: format!("injected failure for {}", bad.row_key),
            });
        }
        self.inner.insert_or_replace_many(entities)
    }

    fn update(&self, entity: TableEntity) -> StoreResult<()> {
        self.write(entity, |e| self.inner.update(e))
    }

    fn delete(&self, entity: TableEntity) -> StoreResult<()> {
        self.inner.delete(entity)
    }

    fn get_record(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> StoreResult<Option<TableEntity>> {
        self.inner.get_record(partition_key, row_key)
    }

    fn get_by_partition_key(
        &self,
        partition_key: &str,
    ) -> StoreResult<Vec<TableEntity>> {
        self.inner.get_by_partition_key(partition_key)
    }

    fn get_by_partition_key_paged(
        &self,
        partition_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> StoreResult<PagedResult<TableEntity>> {
        self.inner
            .get_by_partition_key_paged(partition_key, page_size, continuation_token)
    }

    fn get_by_row_key(&self, row_key: &str) -> StoreResult<Vec<TableEntity>> {
        self.inner.get_by_row_key(row_key)
    }

    fn get_by_row_key_paged(
        &self,
        row_key: &str,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> StoreResult<PagedResult<TableEntity>> {
        self.inner
            .get_by_row_key_paged(row_key, page_size, continuation_token)
    }

    fn get_all_records(&self) -> StoreResult<Vec<TableEntity>> {
        self.inner.get_all_records()
    }

    fn get_all_records_paged(
        &self,
        page_size: usize,
        continuation_token: Option<&str>,
    ) -> StoreResult<PagedResult<TableEntity>> {
        self.inner.get_all_records_paged(page_size, continuation_token)
    }

    fn get_record_count(&self) -> StoreResult<usize> {
        self.inner.get_record_count()
    }
}
