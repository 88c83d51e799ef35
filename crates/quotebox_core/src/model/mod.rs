//! Quote domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by store, sync and transfer code.
//! - Apply defaulting rules for loose input exactly once, at construction.
//!
//! # Invariants
//! - Every quote held by a store carries a unique `QuoteId`.
//! - `category` is never empty once a `Quote` exists.

pub mod preference;
pub mod quote;
