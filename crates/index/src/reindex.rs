//! Reindexing
//!
//! Rebuilds an index from the primary table: pages through every primary
//! record and upserts each one that passes the index predicate.
//!
//! # Flow
//!
//! ```text
//! page = primary.get_all_records_paged(page_size, token)
//!   for record in page passing P:
//!     acquire slot (gate_timeout, cancellation)
//!     spawn upsert -> on failure: failure callback
//!                  -> always: count += 1, release slot
//!   progress(count)
//! until no continuation token
//! drain in-flight upserts, progress(count)
//! ```
//!
//! At most `max_concurrency` upserts run at once. The call returns only
//! after every spawned upsert has finished, including on error.

use crate::error::{IndexError, Result};
use crate::indexes::Indexes;
use crate::registry::Predicate;
use crate::store::IndexStore;
use futures_util::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::StoreError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Primary records fetched per page
pub const DEFAULT_REINDEX_PAGE_SIZE: usize = 1000;

/// Longest wait for an upsert slot
pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(20);

/// Upsert slots per available CPU
const SLOTS_PER_CPU: usize = 20;

/// Called with the running count of processed records
pub type ProgressCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Called with a record whose upsert failed
pub type FailureCallback<T> = Arc<dyn Fn(&T, &IndexError) + Send + Sync>;

/// Reindex configuration
///
/// ```ignore
/// let opts = ReindexOptions::new()
///     .max_concurrency(8)
///     .on_progress(|n| println!("{} indexed", n));
/// ```
pub struct ReindexOptions<T> {
    /// Upserts allowed in flight at once
    pub max_concurrency: usize,
    /// Primary records fetched per page
    pub page_size: usize,
    /// Longest wait for an upsert slot before giving up
    pub gate_timeout: Duration,
    /// Progress callback
    pub progress: Option<ProgressCallback>,
    /// Per-record failure callback
    pub failure: Option<FailureCallback<T>>,
    /// Stops the reindex at the next slot wait or page boundary
    pub cancellation: CancellationToken,
}

impl<T> ReindexOptions<T> {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upsert concurrency limit
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set the primary page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the slot wait limit
    pub fn gate_timeout(mut self, timeout: Duration) -> Self {
        self.gate_timeout = timeout;
        self
    }

    /// Report progress to `f`
    pub fn on_progress(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }

    /// Report failed upserts to `f`
    pub fn on_failure(mut self, f: impl Fn(&T, &IndexError) + Send + Sync + 'static) -> Self {
        self.failure = Some(Arc::new(f));
        self
    }

    /// Use `token` for cancellation
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn report(&self, count: usize) {
        if let Some(progress) = &self.progress {
            progress(count);
        }
    }
}

impl<T> Default for ReindexOptions<T> {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            max_concurrency: cpus * SLOTS_PER_CPU,
            page_size: DEFAULT_REINDEX_PAGE_SIZE,
            gate_timeout: DEFAULT_GATE_TIMEOUT,
            progress: None,
            failure: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl<T> fmt::Debug for ReindexOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReindexOptions")
            .field("max_concurrency", &self.max_concurrency)
            .field("page_size", &self.page_size)
            .field("gate_timeout", &self.gate_timeout)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<'a, T, PK, RK> Indexes<'a, T, PK, RK>
where
    T: Clone + Send + Sync + 'static,
    PK: Send + Sync + 'static,
    RK: Send + Sync + 'static,
{
    /// Rebuild the index `name` from the primary table
    ///
    /// Returns the number of records processed, failed upserts included.
    /// An upsert that panics counts as failed.
    /// Per-record failures go to the failure callback; `GateTimeout`,
    /// `Cancelled` and primary read errors abort the run.
    pub async fn reindex(&self, name: &str, options: ReindexOptions<T>) -> Result<usize> {
        let (index, predicate) = self.registry.resolve_with_predicate::<T>(name)?;
        let width = options.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        info!(
            index = name,
            table = %self.primary.table_name(),
            max_concurrency = width,
            conditional = predicate.is_some(),
            "Reindex started"
        );

        let mut run = ReindexRun {
            index,
            predicate,
            gate: Arc::new(Semaphore::new(width)),
            count: Arc::new(AtomicUsize::new(0)),
            in_flight: JoinSet::new(),
            options: &options,
        };

        let outcome = run.feed(self).await;
        run.drain().await;

        let count = run.count.load(Ordering::SeqCst);
        match outcome {
            Ok(()) => {
                options.report(count);
                info!(index = name, count, "Reindex finished");
                Ok(count)
            }
            Err(e) => {
                warn!(index = name, count, error = %e, "Reindex aborted");
                Err(e)
            }
        }
    }
}

/// State of one reindex call
struct ReindexRun<'o, T> {
    index: Arc<dyn IndexStore<T>>,
    predicate: Option<Predicate<T>>,
    gate: Arc<Semaphore>,
    count: Arc<AtomicUsize>,
    in_flight: JoinSet<()>,
    options: &'o ReindexOptions<T>,
}

impl<'o, T> ReindexRun<'o, T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Page through the primary and spawn one upsert per admitted record
    async fn feed<PK, RK>(&mut self, indexes: &Indexes<'_, T, PK, RK>) -> Result<()>
    where
        PK: Send + Sync + 'static,
        RK: Send + Sync + 'static,
    {
        let mut token: Option<String> = None;
        loop {
            if self.options.cancellation.is_cancelled() {
                return Err(IndexError::Cancelled);
            }

            let page = indexes
                .primary
                .get_all_records_paged_async(self.options.page_size, token.as_deref())
                .await?;

            for record in page.items {
                if let Some(predicate) = &self.predicate {
                    if !predicate(&record) {
                        continue;
                    }
                }
                let permit = self.acquire().await?;
                self.spawn_upsert(record, permit);
                self.reap();
            }

            self.options.report(self.count.load(Ordering::SeqCst));

            token = page.continuation_token;
            if token.is_none() {
                return Ok(());
            }
        }
    }

    /// Wait for a free slot, bounded by the gate timeout
    async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        let timeout = self.options.gate_timeout;
        let gate = Arc::clone(&self.gate);
        tokio::select! {
            biased;
            _ = self.options.cancellation.cancelled() => Err(IndexError::Cancelled),
            acquired = tokio::time::timeout(timeout, gate.acquire_owned()) => match acquired {
                Ok(Ok(permit)) => Ok(permit),
                // The gate is never closed
                Ok(Err(_)) => Err(IndexError::Cancelled),
                Err(_) => Err(IndexError::GateTimeout(timeout)),
            },
        }
    }

    fn spawn_upsert(&mut self, record: T, permit: OwnedSemaphorePermit) {
        let index = Arc::clone(&self.index);
        let count = Arc::clone(&self.count);
        let failure = self.options.failure.clone();
        self.in_flight.spawn(async move {
            let outcome = AssertUnwindSafe(index.upsert_async(&record))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(StoreError::Backend {
                        status: 500,
                        message: "index upsert panicked".to_string(),
                    })
                });
            if let Err(e) = outcome {
                let e = IndexError::from(e);
                warn!(index = %index.table_name(), error = %e, "Reindex upsert failed");
                if let Some(failure) = failure {
                    failure(&record, &e);
                }
            }
            count.fetch_add(1, Ordering::SeqCst);
            drop(permit);
        });
    }

    /// Collect finished upserts without waiting
    fn reap(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            log_join_error(joined);
        }
    }

    /// Wait for every in-flight upsert
    async fn drain(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            log_join_error(joined);
        }
    }
}

fn log_join_error(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "Reindex upsert task did not complete");
    }
}
