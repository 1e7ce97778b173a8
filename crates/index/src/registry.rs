//! Index registry
//!
//! Maps index names to attached index stores and their optional
//! predicates. Entries are type-erased: each holds an
//! `Arc<dyn IndexStore<T>>` behind `Any`, recovered by downcast when a
//! caller resolves the name for a record type.
//!
//! # Locking
//!
//! Both maps live behind one `parking_lot::Mutex`. The lock is held only
//! for map access and is never held across store I/O or while detaching
//! event handlers.

use crate::error::{IndexError, Result};
use crate::store::IndexStore;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Membership predicate of a conditional index
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Runs once when an entry leaves the registry
pub(crate) type Detach = Box<dyn FnOnce() + Send>;

static GLOBAL: Lazy<IndexRegistry> = Lazy::new(IndexRegistry::new);

struct IndexEntry {
    /// Distinguishes re-attachments under the same name
    attachment: u64,
    /// `Arc<dyn IndexStore<T>>`
    store: Box<dyn Any + Send + Sync>,
    /// The concrete index store, for typed access
    concrete: Arc<dyn Any + Send + Sync>,
    detach: Option<Detach>,
}

#[derive(Default)]
struct RegistryMaps {
    entries: HashMap<String, IndexEntry>,
    /// `Predicate<T>` per conditional index
    predicates: HashMap<String, Box<dyn Any + Send + Sync>>,
}

/// Name -> index store registry
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct IndexRegistry {
    maps: Arc<Mutex<RegistryMaps>>,
    attachments: Arc<AtomicU64>,
}

/// Non-owning registry handle held by event handlers
#[derive(Clone)]
pub(crate) struct WeakRegistry {
    maps: Weak<Mutex<RegistryMaps>>,
    attachments: Weak<AtomicU64>,
}

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<IndexRegistry> {
        Some(IndexRegistry {
            maps: self.maps.upgrade()?,
            attachments: self.attachments.upgrade()?,
        })
    }
}

impl IndexRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static IndexRegistry {
        &GLOBAL
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            maps: Arc::downgrade(&self.maps),
            attachments: Arc::downgrade(&self.attachments),
        }
    }

    /// Register `name` atomically
    ///
    /// `attach` runs under the registry lock once the name is known to be
    /// free; it receives the attachment id and returns the closure that
    /// undoes the attachment.
    pub(crate) fn register<T, S>(
        &self,
        name: &str,
        index: Arc<S>,
        predicate: Option<Predicate<T>>,
        attach: impl FnOnce(u64) -> Detach,
    ) -> Result<()>
    where
        T: 'static,
        S: IndexStore<T> + 'static,
    {
        let mut maps = self.maps.lock();
        if maps.entries.contains_key(name) {
            return Err(IndexError::DuplicateIndex(name.to_string()));
        }

        let attachment = self.attachments.fetch_add(1, Ordering::Relaxed) + 1;
        let detach = attach(attachment);
        let store: Arc<dyn IndexStore<T>> = index.clone();
        maps.entries.insert(
            name.to_string(),
            IndexEntry {
                attachment,
                store: Box::new(store),
                concrete: index,
                detach: Some(detach),
            },
        );
        if let Some(predicate) = predicate {
            maps.predicates.insert(name.to_string(), Box::new(predicate));
        }
        Ok(())
    }

    /// Remove `name` from both maps and detach it
    ///
    /// Returns false if the name was not registered.
    pub fn unregister(&self, name: &str) -> bool {
        let entry = {
            let mut maps = self.maps.lock();
            maps.predicates.remove(name);
            maps.entries.remove(name)
        };
        match entry {
            Some(entry) => {
                Self::detach(entry);
                true
            }
            None => false,
        }
    }

    /// Remove `name` only if it still refers to `attachment`
    pub(crate) fn unregister_attachment(&self, name: &str, attachment: u64) -> bool {
        let entry = {
            let mut maps = self.maps.lock();
            match maps.entries.get(name) {
                Some(entry) if entry.attachment == attachment => {
                    maps.predicates.remove(name);
                    maps.entries.remove(name)
                }
                _ => None,
            }
        };
        match entry {
            Some(entry) => {
                Self::detach(entry);
                true
            }
            None => false,
        }
    }

    /// Remove `name` and return its index store
    ///
    /// The entry stays registered if it holds a different record type.
    pub(crate) fn take<T: 'static>(&self, name: &str) -> Result<Arc<dyn IndexStore<T>>> {
        let (store, entry) = {
            let mut maps = self.maps.lock();
            let store = Self::typed_store::<T>(&maps, name)?;
            maps.predicates.remove(name);
            (store, maps.entries.remove(name))
        };
        if let Some(entry) = entry {
            Self::detach(entry);
        }
        Ok(store)
    }

    /// Index store registered under `name`
    pub fn resolve<T: 'static>(&self, name: &str) -> Result<Arc<dyn IndexStore<T>>> {
        Self::typed_store(&self.maps.lock(), name)
    }

    /// Predicate of `name`, `None` if unconditional or not registered
    pub fn resolve_predicate<T: 'static>(&self, name: &str) -> Option<Predicate<T>> {
        Self::typed_predicate(&self.maps.lock(), name)
    }

    /// Index store and predicate read under one lock acquisition
    pub fn resolve_with_predicate<T: 'static>(
        &self,
        name: &str,
    ) -> Result<(Arc<dyn IndexStore<T>>, Option<Predicate<T>>)> {
        let maps = self.maps.lock();
        let store = Self::typed_store(&maps, name)?;
        Ok((store, Self::typed_predicate(&maps, name)))
    }

    /// The concrete index store registered under `name`
    pub fn resolve_concrete<S: Any + Send + Sync>(&self, name: &str) -> Result<Arc<S>> {
        let concrete = {
            let maps = self.maps.lock();
            let entry = maps
                .entries
                .get(name)
                .ok_or_else(|| IndexError::IndexNotFound(name.to_string()))?;
            Arc::clone(&entry.concrete)
        };
        concrete
            .downcast::<S>()
            .map_err(|_| IndexError::IndexTypeMismatch {
                name: name.to_string(),
                expected: type_name::<S>(),
            })
    }

    /// True if `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.maps.lock().entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.maps.lock().entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered indexes
    pub fn len(&self) -> usize {
        self.maps.lock().entries.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn typed_store<T: 'static>(maps: &RegistryMaps, name: &str) -> Result<Arc<dyn IndexStore<T>>> {
        let entry = maps
            .entries
            .get(name)
            .ok_or_else(|| IndexError::IndexNotFound(name.to_string()))?;
        entry
            .store
            .downcast_ref::<Arc<dyn IndexStore<T>>>()
            .cloned()
            .ok_or_else(|| IndexError::IndexTypeMismatch {
                name: name.to_string(),
                expected: type_name::<dyn IndexStore<T>>(),
            })
    }

    fn typed_predicate<T: 'static>(maps: &RegistryMaps, name: &str) -> Option<Predicate<T>> {
        maps.predicates
            .get(name)
            .and_then(|p| p.downcast_ref::<Predicate<T>>())
            .cloned()
    }

    fn detach(mut entry: IndexEntry) {
        if let Some(detach) = entry.detach.take() {
            detach();
        }
    }
}
