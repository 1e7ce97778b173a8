//! Index attachment and detachment
//!
//! Attaching an index subscribes handlers on the primary store's events:
//!
//! | Primary event       | Unconditional index   | Conditional index                    |
//! |---------------------|-----------------------|--------------------------------------|
//! | inserted_or_updated | upsert                | upsert if P(r), else delete          |
//! | many_inserted       | upsert all            | upsert records passing P             |
//! | deleted             | delete                | delete                               |
//! | table_deleted       | unregister, drop table| unregister, drop table               |
//! | table_created       | create table          | create table                         |
//!
//! Deletes tolerate a missing index row. Every other handler error is
//! returned from the primary operation that raised the event.

use crate::error::Result;
use crate::indexes::Indexes;
use crate::registry::{Detach, Predicate, WeakRegistry};
use crate::store::IndexStore;
use futures_util::FutureExt;
use std::sync::Arc;
use tessera_core::Result as StoreResult;
use tessera_typed::{StoreEvents, SubscriptionId};
use tracing::{debug, info};

impl<'a, T, PK, RK> Indexes<'a, T, PK, RK>
where
    T: Clone + Send + Sync + 'static,
    PK: Send + Sync + 'static,
    RK: Send + Sync + 'static,
{
    /// Attach an index that mirrors every record
    ///
    /// Fails with `DuplicateIndex` if `name` is taken.
    pub fn add_index<S>(&self, name: &str, index: Arc<S>) -> Result<()>
    where
        S: IndexStore<T> + 'static,
    {
        self.attach(name, index, None)
    }

    /// Attach an index holding only records that pass `predicate`
    pub fn add_conditional_index<S>(
        &self,
        name: &str,
        index: Arc<S>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<()>
    where
        S: IndexStore<T> + 'static,
    {
        self.attach(name, index, Some(Arc::new(predicate)))
    }

    fn attach<S>(&self, name: &str, index: Arc<S>, predicate: Option<Predicate<T>>) -> Result<()>
    where
        S: IndexStore<T> + 'static,
    {
        let conditional = predicate.is_some();
        let store: Arc<dyn IndexStore<T>> = index.clone();
        let registry = self.registry.downgrade();
        let primary = Arc::downgrade(self.primary);
        let events = self.primary.events();

        self.registry
            .register(name, index, predicate.clone(), |attachment| -> Detach {
                let subscriptions = Propagation {
                    name: name.to_string(),
                    index: store,
                    predicate,
                    registry,
                    attachment,
                }
                .subscribe(events);

                Box::new(move || {
                    if let Some(primary) = primary.upgrade() {
                        for id in subscriptions {
                            primary.events().unsubscribe(id);
                        }
                    }
                })
            })?;

        info!(
            index = name,
            table = %self.primary.table_name(),
            conditional,
            "Secondary index attached"
        );
        Ok(())
    }

    /// Detach an index, keeping its table
    ///
    /// Propagation stops immediately. No-op if `name` is not attached.
    pub fn remove_index(&self, name: &str) {
        if self.registry.unregister(name) {
            info!(index = name, "Secondary index removed");
        }
    }

    /// Detach an index and delete its table
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let store = self.registry.take::<T>(name)?;
        store.delete_table()?;
        info!(index = name, table = %store.table_name(), "Secondary index dropped");
        Ok(())
    }

    /// Async version of `drop_index()`
    pub async fn drop_index_async(&self, name: &str) -> Result<()> {
        let store = self.registry.take::<T>(name)?;
        store.delete_table_async().await?;
        info!(index = name, table = %store.table_name(), "Secondary index dropped");
        Ok(())
    }
}

/// Everything a propagation handler needs
struct Propagation<T> {
    name: String,
    index: Arc<dyn IndexStore<T>>,
    predicate: Option<Predicate<T>>,
    registry: WeakRegistry,
    attachment: u64,
}

impl<T> Clone for Propagation<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            index: Arc::clone(&self.index),
            predicate: self.predicate.clone(),
            registry: self.registry.clone(),
            attachment: self.attachment,
        }
    }
}

impl<T> Propagation<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Subscribe one handler per event, sync and async
    fn subscribe(self, events: &StoreEvents<T>) -> Vec<SubscriptionId> {
        let mut ids = Vec::with_capacity(10);

        let p = self.clone();
        ids.push(events.on_inserted_or_updated(move |record| p.upsert(record)));
        let p = self.clone();
        ids.push(events.on_inserted_or_updated_async(move |record| {
            let p = p.clone();
            async move { p.upsert_async(record).await }.boxed()
        }));

        let p = self.clone();
        ids.push(events.on_many_inserted(move |records| match p.passing(records) {
            Some(pass) => p.index.upsert_many(&pass),
            None => p.index.upsert_many(records),
        }));
        let p = self.clone();
        ids.push(events.on_many_inserted_async(move |records| {
            let p = p.clone();
            async move {
                let records = p.passing(&records).unwrap_or(records);
                p.index.upsert_many_async(&records).await
            }
            .boxed()
        }));

        let p = self.clone();
        ids.push(events.on_deleted(move |record| p.ignore_missing(p.index.delete(record))));
        let p = self.clone();
        ids.push(events.on_deleted_async(move |record| {
            let p = p.clone();
            async move { p.ignore_missing(p.index.delete_async(&record).await) }.boxed()
        }));

        let p = self.clone();
        ids.push(events.on_table_deleted(move |_| {
            p.unregister();
            p.index.delete_table()
        }));
        let p = self.clone();
        ids.push(events.on_table_deleted_async(move |_| {
            let p = p.clone();
            async move {
                p.unregister();
                p.index.delete_table_async().await
            }
            .boxed()
        }));

        let p = self.clone();
        ids.push(events.on_table_created(move |_| p.index.create_table()));
        let p = self;
        ids.push(events.on_table_created_async(move |_| {
            let p = p.clone();
            async move { p.index.create_table_async().await }.boxed()
        }));

        ids
    }

    fn admits(&self, record: &T) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(record))
    }

    /// Records passing the predicate, `None` if unconditional
    fn passing(&self, records: &[T]) -> Option<Vec<T>> {
        self.predicate
            .as_ref()
            .map(|p| records.iter().filter(|r| p(r)).cloned().collect())
    }

    fn upsert(&self, record: &T) -> StoreResult<()> {
        if self.admits(record) {
            self.index.upsert(record)
        } else {
            debug!(index = %self.name, "Record fails index condition, removing");
            self.ignore_missing(self.index.delete(record))
        }
    }

    async fn upsert_async(&self, record: T) -> StoreResult<()> {
        if self.admits(&record) {
            self.index.upsert_async(&record).await
        } else {
            debug!(index = %self.name, "Record fails index condition, removing");
            self.ignore_missing(self.index.delete_async(&record).await)
        }
    }

    /// Treat a missing index row as already deleted
    fn ignore_missing(&self, result: StoreResult<()>) -> StoreResult<()> {
        match result {
            Err(e) if e.is_not_found() => {
                debug!(index = %self.name, error = %e, "Index row already absent");
                Ok(())
            }
            other => other,
        }
    }

    /// Cascade from a primary table drop
    fn unregister(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.unregister_attachment(&self.name, self.attachment) {
                info!(index = %self.name, "Primary table deleted, index dropped");
            }
        }
    }
}
