//! Persisted metadata store: schema, reconciliation, persistence, locks.

pub mod dictionary;
pub mod persist;
pub mod reconcile;
pub mod schema;

pub use persist::{FsStore, MemoryStore, ResourceLocks, StorePersist};
pub use schema::{EntryRecord, MetadataStore, StoreStats};
