//! Store events
//!
//! Every typed store owns a [`StoreEvents`] with one observer list per
//! event. Synchronous operations notify the synchronous handlers; async
//! operations await the async handlers. Handlers run after the table write
//! succeeded, one at a time in subscription order, and the first handler
//! error is returned from the operation that raised the event.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_core::Result;

/// Synchronous event handler
pub type Handler<A> = Arc<dyn Fn(&A) -> Result<()> + Send + Sync>;

/// Async event handler
pub type AsyncHandler<A> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer list for one event
pub struct EventList<A> {
    sync: Mutex<Vec<(SubscriptionId, Handler<A>)>>,
    async_: Mutex<Vec<(SubscriptionId, AsyncHandler<A>)>>,
}

impl<A> EventList<A> {
    fn new() -> Self {
        Self {
            sync: Mutex::new(Vec::new()),
            async_: Mutex::new(Vec::new()),
        }
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.sync.lock().retain(|(sid, _)| {
            let keep = *sid != id;
            removed |= !keep;
            keep
        });
        self.async_.lock().retain(|(sid, _)| {
            let keep = *sid != id;
            removed |= !keep;
            keep
        });
        removed
    }

    /// Number of sync and async handlers
    pub fn len(&self) -> usize {
        self.sync.lock().len() + self.async_.lock().len()
    }

    /// True if no handler is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke the sync handlers
    pub fn emit(&self, arg: &A) -> Result<()> {
        // Snapshot so handlers may subscribe or unsubscribe
        let handlers: Vec<Handler<A>> = self
            .sync
            .lock()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(arg)?;
        }
        Ok(())
    }

    /// Await the async handlers
    pub async fn emit_async(&self, arg: &A) -> Result<()>
    where
        A: Clone,
    {
        let handlers: Vec<AsyncHandler<A>> =
            self.async_.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in handlers {
            handler(arg.clone()).await?;
        }
        Ok(())
    }
}

/// All events raised by a typed store of `T`
pub struct StoreEvents<T> {
    next_id: AtomicU64,
    inserted_or_updated: EventList<T>,
    many_inserted: EventList<Vec<T>>,
    deleted: EventList<T>,
    table_created: EventList<String>,
    table_deleted: EventList<String>,
}

macro_rules! subscribe_fns {
    ($list:ident, $arg:ty, $sync_fn:ident, $async_fn:ident, $doc:literal) => {
        #[doc = concat!("Subscribe to ", $doc)]
        pub fn $sync_fn(
            &self,
            handler: impl Fn(&$arg) -> Result<()> + Send + Sync + 'static,
        ) -> SubscriptionId {
            let id = self.next_id();
            self.$list.sync.lock().push((id, Arc::new(handler)));
            id
        }

        #[doc = concat!("Subscribe an async handler to ", $doc)]
        pub fn $async_fn(
            &self,
            handler: impl Fn($arg) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
        ) -> SubscriptionId {
            let id = self.next_id();
            self.$list.async_.lock().push((id, Arc::new(handler)));
            id
        }
    };
}

impl<T> StoreEvents<T> {
    /// Create empty observer lists
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            inserted_or_updated: EventList::new(),
            many_inserted: EventList::new(),
            deleted: EventList::new(),
            table_created: EventList::new(),
            table_deleted: EventList::new(),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    subscribe_fns!(
        inserted_or_updated,
        T,
        on_inserted_or_updated,
        on_inserted_or_updated_async,
        "single-record inserts, replaces and updates"
    );
    subscribe_fns!(
        many_inserted,
        Vec<T>,
        on_many_inserted,
        on_many_inserted_async,
        "batch inserts"
    );
    subscribe_fns!(deleted, T, on_deleted, on_deleted_async, "record deletes");
    subscribe_fns!(
        table_created,
        String,
        on_table_created,
        on_table_created_async,
        "table creation"
    );
    subscribe_fns!(
        table_deleted,
        String,
        on_table_deleted,
        on_table_deleted_async,
        "table deletion"
    );

    /// Remove a handler from whichever list holds it
    ///
    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // Ids are unique across lists, at most one removal succeeds
        self.inserted_or_updated.remove(id)
            | self.many_inserted.remove(id)
            | self.deleted.remove(id)
            | self.table_created.remove(id)
            | self.table_deleted.remove(id)
    }

    /// Total handlers across all events
    pub fn subscriber_count(&self) -> usize {
        self.inserted_or_updated.len()
            + self.many_inserted.len()
            + self.deleted.len()
            + self.table_created.len()
            + self.table_deleted.len()
    }

    pub(crate) fn inserted_or_updated(&self) -> &EventList<T> {
        &self.inserted_or_updated
    }

    pub(crate) fn many_inserted(&self) -> &EventList<Vec<T>> {
        &self.many_inserted
    }

    pub(crate) fn deleted(&self) -> &EventList<T> {
        &self.deleted
    }

    pub(crate) fn table_created(&self) -> &EventList<String> {
        &self.table_created
    }

    pub(crate) fn table_deleted(&self) -> &EventList<String> {
        &self.table_deleted
    }
}

impl<T> Default for StoreEvents<T> {
    fn default() -> Self {
        Self::new()
    }
}
