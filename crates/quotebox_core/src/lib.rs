//! Core domain logic for quotebox.
//! This crate is the single source of truth for quote, storage and sync
//! invariants; front ends only render what a `QuoteSession` returns.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod presentation;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use config::{ConfigError, SyncConfig};
pub use error::{NetworkError, QuoteError, QuoteResult, StorageError};
pub use logging::{default_log_level, init_logging, LogLevel, LoggingError};
pub use model::preference::{FilterPreference, SortOrder, ALL_CATEGORIES};
pub use model::quote::{NewQuote, Quote, QuoteId, QuoteRecord, QuoteSource};
pub use presentation::{Notice, NoticeLevel, QuoteStats, RenderedQuote};
pub use session::{start_auto_sync, AutoSyncHandle, QuoteSession, SharedSession, SyncReport};
pub use storage::{KeyValueStore, MemoryKeyValueStore, PersistenceAdapter, SqliteKeyValueStore};
pub use store::quote_store::{ImportReport, QuoteStore};
pub use sync::engine::SyncState;
pub use sync::reconcile::{reconcile, ReconciliationResult, ResolutionPolicy};
pub use sync::remote::{HttpRemoteSource, RemoteQuoteSource, RemoteSyncAdapter};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
