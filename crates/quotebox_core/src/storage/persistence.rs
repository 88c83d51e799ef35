//! Snapshot persistence over two key-value namespaces.
//!
//! # Responsibility
//! - Serialize/deserialize the quote snapshot and the filter preference.
//! - Keep per-session data (last viewed quote) in the ephemeral namespace.
//! - Convert load failures into "absent" so callers fall back to defaults.
//!
//! # Invariants
//! - The adapter never holds a live reference to the quote store; it only
//!   reads and writes serialized snapshots.
//! - Categories are written for export compatibility but never read back as
//!   authoritative; callers recompute them from the quotes.

use crate::error::StorageError;
use crate::model::preference::FilterPreference;
use crate::model::quote::{now_timestamp, Quote};
use crate::storage::kv_store::{KeyValueStore, StorageResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Durable key holding quotes + categories.
pub const QUOTES_KEY: &str = "quote_generator_data";
/// Durable key holding the filter preference.
pub const PREFERENCE_KEY: &str = "quote_filter_preference";
/// Session key holding the last rendered quote.
pub const LAST_VIEWED_KEY: &str = "last_viewed_quote";

/// In-memory view of everything the adapter persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub quotes: Vec<Quote>,
    pub categories: Vec<String>,
    pub preference: FilterPreference,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredQuotes {
    quotes: Vec<Quote>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Reads and writes snapshots through durable and session key-value stores.
pub struct PersistenceAdapter {
    durable: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(durable: Box<dyn KeyValueStore>, session: Box<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Writes the quote snapshot and the preference, each as a whole value.
    pub fn save(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        let stored = StoredQuotes {
            quotes: snapshot.quotes.clone(),
            categories: snapshot.categories.clone(),
            last_updated: Some(now_timestamp()),
        };
        let quotes_json = encode(QUOTES_KEY, &stored)?;
        self.durable.set(QUOTES_KEY, &quotes_json)?;
        self.save_preference(&snapshot.preference)?;

        info!(
            "event=snapshot_save module=storage status=ok quotes={} categories={}",
            snapshot.quotes.len(),
            snapshot.categories.len()
        );
        Ok(())
    }

    /// Loads the last saved snapshot.
    ///
    /// Returns `None` when nothing was saved, the stored text is malformed, or
    /// the backend fails. Invalid or id-duplicated quotes inside an otherwise
    /// readable snapshot are dropped.
    pub fn load(&self) -> Option<Snapshot> {
        let raw = match self.durable.get(QUOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("event=snapshot_load module=storage status=absent");
                return None;
            }
            Err(err) => {
                warn!(
                    "event=snapshot_load module=storage status=error error_code=storage_read_failed error={err}"
                );
                return None;
            }
        };

        let stored: StoredQuotes = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    "event=snapshot_load module=storage status=error error_code=snapshot_malformed error={err}"
                );
                return None;
            }
        };

        let total = stored.quotes.len();
        let mut seen_ids = HashSet::new();
        let quotes: Vec<Quote> = stored
            .quotes
            .into_iter()
            .filter(|quote| quote.validate().is_ok() && seen_ids.insert(quote.id))
            .collect();
        if quotes.len() != total {
            warn!(
                "event=snapshot_load module=storage status=partial dropped={}",
                total - quotes.len()
            );
        }

        info!(
            "event=snapshot_load module=storage status=ok quotes={}",
            quotes.len()
        );
        Some(Snapshot {
            quotes,
            categories: stored.categories,
            preference: self.load_preference().unwrap_or_default(),
        })
    }

    /// Writes only the filter preference.
    pub fn save_preference(&mut self, preference: &FilterPreference) -> StorageResult<()> {
        let json = encode(PREFERENCE_KEY, preference)?;
        self.durable.set(PREFERENCE_KEY, &json)
    }

    /// Reads the filter preference; malformed or missing values yield `None`.
    pub fn load_preference(&self) -> Option<FilterPreference> {
        read_json(self.durable.as_ref(), PREFERENCE_KEY)
    }

    /// Remembers the last rendered quote for this session only.
    pub fn save_last_viewed(&mut self, quote: &Quote) -> StorageResult<()> {
        let json = encode(LAST_VIEWED_KEY, quote)?;
        self.session.set(LAST_VIEWED_KEY, &json)
    }

    pub fn load_last_viewed(&self) -> Option<Quote> {
        read_json(self.session.as_ref(), LAST_VIEWED_KEY)
    }

    /// Removes every key this adapter owns in both namespaces.
    pub fn clear_all(&mut self) -> StorageResult<()> {
        self.durable.remove(QUOTES_KEY)?;
        self.durable.remove(PREFERENCE_KEY)?;
        self.session.remove(LAST_VIEWED_KEY)?;
        info!("event=storage_clear module=storage status=ok");
        Ok(())
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(
                "event=kv_read module=storage status=error key={key} error_code=storage_read_failed error={err}"
            );
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "event=kv_read module=storage status=error key={key} error_code=value_malformed error={err}"
            );
            None
        }
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> StorageResult<String> {
    serde_json::to_string(value).map_err(|err| StorageError::Serialization {
        key: key.to_string(),
        message: err.to_string(),
    })
}
