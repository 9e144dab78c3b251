//! In-memory storage backend.
//!
//! This module provides a thread-safe in-memory implementation of
//! `VersionedStore`. It backs both the record store and the chart store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::chart::ChartSpec;
use crate::error::StorageError;
use crate::record::Record;
use crate::storage::traits::{Keyed, StoreChange, VersionedStore};

/// Default per-subscriber notification buffer.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 1024;

#[derive(Debug)]
struct StoreState<T> {
    items: IndexMap<i64, T>,
    version: u64,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            version: 0,
        }
    }
}

/// Thread-safe in-memory versioned store.
#[derive(Debug)]
pub struct InMemoryStore<T> {
    name: &'static str,
    state: RwLock<StoreState<T>>,
    watchers: Mutex<Vec<Sender<StoreChange>>>,
    notify_capacity: usize,
    dropped_notifications: AtomicU64,
}

impl<T: Keyed> InMemoryStore<T> {
    /// Create a new empty store. `name` shows up in logs and notifications.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_notify_capacity(name, DEFAULT_NOTIFY_CAPACITY)
    }

    /// Create a store whose subscribers buffer at most `capacity` changes.
    #[must_use]
    pub fn with_notify_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            state: RwLock::new(StoreState::default()),
            watchers: Mutex::new(Vec::new()),
            notify_capacity: capacity.max(1),
            dropped_notifications: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of entities, or 0 if the lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.items.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest id currently stored, or 0 when empty.
    pub fn max_id(&self) -> Result<i64, StorageError> {
        let state = self.state.read().map_err(|_| self.lock_err("max_id"))?;
        Ok(max_key(&state.items))
    }

    /// Notifications skipped because a subscriber's buffer was full.
    #[must_use]
    pub fn dropped_notifications(&self) -> u64 {
        self.dropped_notifications.load(Ordering::Relaxed)
    }

    const fn lock_err(&self, context: &'static str) -> StorageError {
        StorageError::PoisonedLock {
            store: self.name,
            context,
        }
    }

    fn normalize(&self, op: &'static str, item: T) -> Result<T, StorageError> {
        let id = item.id();
        item.normalize().map_err(|source| {
            let err = StorageError::Rejected {
                store: self.name,
                source,
            };
            warn!(store = self.name, op, id, error = %err, "store mutation rolled back");
            err
        })
    }

    /// Applies `apply` under the write lock and bumps the version if it
    /// succeeds. `apply` must not touch `items` before it can no longer fail.
    fn mutate<R, F>(&self, op: &'static str, apply: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut IndexMap<i64, T>) -> Result<R, StorageError>,
    {
        let committed = self
            .state
            .write()
            .map_err(|_| self.lock_err(op))
            .and_then(|mut state| {
                let out = apply(&mut state.items)?;
                state.version += 1;
                Ok((out, state.version))
            });

        match committed {
            Ok((out, version)) => {
                debug!(store = self.name, op, version, "store mutation committed");
                self.notify(version);
                Ok(out)
            }
            Err(err) => {
                warn!(store = self.name, op, error = %err, "store mutation rolled back");
                Err(err)
            }
        }
    }

    fn notify(&self, version: u64) {
        let Ok(mut watchers) = self.watchers.lock() else {
            warn!(store = self.name, "watcher list poisoned; change not broadcast");
            return;
        };
        let change = StoreChange {
            store: self.name,
            version,
        };
        watchers.retain(|tx| match tx.try_send(change) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped_notifications.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

fn max_key<T>(items: &IndexMap<i64, T>) -> i64 {
    items.keys().copied().max().unwrap_or(0)
}

impl<T: Keyed> VersionedStore<T> for InMemoryStore<T> {
    fn replace_all(&self, items: Vec<T>) -> Result<(), StorageError> {
        // Normalize outside the lock; a rejected item aborts before any write.
        let mut next = IndexMap::with_capacity(items.len());
        for item in items {
            let item = self.normalize("replace_all", item)?;
            next.insert(item.id(), item);
        }
        self.mutate("replace_all", move |current| {
            *current = next;
            Ok(())
        })
    }

    fn upsert(&self, id: i64, item: T) -> Result<i64, StorageError> {
        let mut item = self.normalize("upsert", item)?;
        let name = self.name;
        self.mutate("upsert", move |current| {
            let assigned = if id == 0 {
                let max_id = max_key(current);
                max_id
                    .checked_add(1)
                    .ok_or(StorageError::IdOverflow { store: name, max_id })?
            } else {
                id
            };
            item.set_id(assigned);
            current.insert(assigned, item);
            Ok(assigned)
        })
    }

    fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.mutate("delete", |current| Ok(current.shift_remove(&id).is_some()))
    }

    fn get(&self, id: i64) -> Result<Option<T>, StorageError> {
        let state = self.state.read().map_err(|_| self.lock_err("get"))?;
        Ok(state.items.get(&id).cloned())
    }

    fn select_all(&self) -> Result<Vec<T>, StorageError> {
        let state = self.state.read().map_err(|_| self.lock_err("select_all"))?;
        Ok(state.items.values().cloned().collect())
    }

    fn select_where(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>, StorageError> {
        let state = self.state.read().map_err(|_| self.lock_err("select_where"))?;
        Ok(state.items.values().filter(|item| predicate(item)).cloned().collect())
    }

    fn version(&self) -> u64 {
        self.state.read().map(|s| s.version).unwrap_or(0)
    }

    fn subscribe(&self) -> Receiver<StoreChange> {
        let (tx, rx) = bounded(self.notify_capacity);
        match self.watchers.lock() {
            Ok(mut watchers) => watchers.push(tx),
            Err(_) => warn!(store = self.name, "watcher list poisoned; subscriber will not be notified"),
        }
        rx
    }
}

/// The two stores a dashboard session owns.
#[derive(Debug)]
pub struct InMemoryStores {
    pub records: InMemoryStore<Record>,
    pub charts: InMemoryStore<ChartSpec>,
}

impl InMemoryStores {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: InMemoryStore::new("records"),
            charts: InMemoryStore::new("charts"),
        }
    }
}

impl Default for InMemoryStores {
    fn default() -> Self {
        Self::new()
    }
}
