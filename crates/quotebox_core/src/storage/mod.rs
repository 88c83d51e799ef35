//! Key-value persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the get/set capability the persistence adapter writes through.
//! - Provide a durable SQLite backend and an ephemeral in-memory backend.
//!
//! # Invariants
//! - Values are UTF-8 text (JSON documents); writes overwrite the whole value.
//! - Backends never interpret stored values.

pub mod kv_store;
pub mod persistence;

pub use kv_store::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use persistence::{PersistenceAdapter, Snapshot};
