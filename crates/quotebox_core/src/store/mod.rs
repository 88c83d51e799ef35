//! In-memory quote collection and its derived category index.
//!
//! # Responsibility
//! - Own the ordered quote sequence for one session.
//! - Derive category labels from the sequence, never the other way round.
//!
//! # Invariants
//! - Insertion order is preserved by every mutation except `replace_all`,
//!   which installs the caller's order verbatim.
//! - Quote ids are unique within a store.

pub mod category_index;
pub mod defaults;
pub mod quote_store;
