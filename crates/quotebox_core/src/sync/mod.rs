//! Remote sync: source adapters, reconciliation, state machine, auto timer.
//!
//! # Responsibility
//! - Fetch remote quotes and push local ones through a `RemoteQuoteSource`.
//! - Classify remote vs local quotes and apply a resolution policy.
//! - Guard against overlapping sync cycles and late results.
//!
//! # Invariants
//! - Network failures never escape the remote adapter as panics.
//! - A cancelled cycle never mutates the quote store.

pub mod auto_sync;
pub mod engine;
pub mod reconcile;
pub mod remote;
