//! Abstract store traits for Tallyboard.
//!
//! Records and chart specs live in two independent instances of the same
//! versioned keyed collection. Consumers detect staleness by comparing the
//! store's version counter with the last value they saw.

use crossbeam_channel::Receiver;

use crate::error::{StorageError, ValidationError};

/// An entity addressable by an integer id.
pub trait Keyed: Clone + Send + Sync + 'static {
    /// The entity's key.
    fn id(&self) -> i64;

    /// Overwrites the entity's key. Used when the store assigns an id.
    fn set_id(&mut self, id: i64);

    /// Normalization applied to every item before it is written.
    ///
    /// Returning an error aborts the whole mutation.
    fn normalize(self) -> Result<Self, ValidationError> {
        Ok(self)
    }
}

/// Notification sent to subscribers after a committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    /// Name of the store that changed.
    pub store: &'static str,
    /// Version after the mutation.
    pub version: u64,
}

/// Versioned keyed collection.
///
/// # Invariants
/// - The version starts at 0 and increases by exactly one per successful
///   mutating call. It is never reset or decremented.
/// - A mutating call that returns `Err` leaves contents and version untouched.
/// - Snapshots are in insertion order; overwriting an existing id keeps its
///   position.
pub trait VersionedStore<T: Keyed>: Send + Sync {
    /// Replaces the whole collection.
    fn replace_all(&self, items: Vec<T>) -> Result<(), StorageError>;

    /// Inserts or overwrites `item` at `id`, returning the id written.
    ///
    /// An `id` of 0 assigns `max(existing ids) + 1`, or 1 when empty.
    fn upsert(&self, id: i64, item: T) -> Result<i64, StorageError>;

    /// Removes the entity with `id`, returning whether one existed.
    ///
    /// The version advances even when nothing was removed.
    fn delete(&self, id: i64) -> Result<bool, StorageError>;

    /// Fetches a single entity.
    fn get(&self, id: i64) -> Result<Option<T>, StorageError>;

    /// Snapshot of all entities.
    fn select_all(&self) -> Result<Vec<T>, StorageError>;

    /// Snapshot of entities matching `predicate`.
    fn select_where(&self, predicate: &dyn Fn(&T) -> bool) -> Result<Vec<T>, StorageError>;

    /// Current version counter.
    fn version(&self) -> u64;

    /// Registers a change subscriber.
    fn subscribe(&self) -> Receiver<StoreChange>;
}
