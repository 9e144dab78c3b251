//! Versioned keyed stores for Tallyboard.
//!
//! The traits define the contract; `memory` provides the in-process backend
//! used for both records and chart specs.

mod memory;
mod traits;

pub use memory::{InMemoryStore, InMemoryStores, DEFAULT_NOTIFY_CAPACITY};
pub use traits::{Keyed, StoreChange, VersionedStore};
