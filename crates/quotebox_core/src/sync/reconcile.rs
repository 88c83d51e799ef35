//! Local/remote quote reconciliation and resolution policies.
//!
//! # Responsibility
//! - Classify fetched remote quotes against the local store by id.
//! - Produce the next store contents for a caller-selected policy.
//!
//! # Invariants
//! - Remote input is deduplicated by id; the later entry wins.
//! - Local-only quotes are reported but never discarded by any policy.
//! - Output never contains two quotes with the same id; on overlap the remote
//!   side is placed first and wins.

use crate::model::quote::{Quote, QuoteId};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Local and remote versions of a quote whose content differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub local: Quote,
    pub remote: Quote,
}

/// Classification produced by one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub conflicts: Vec<Conflict>,
    /// Remote quotes with no local counterpart, in remote order.
    pub new_remote_only: Vec<Quote>,
    /// Local quotes absent from the remote list, in local order.
    pub local_only: Vec<Quote>,
}

impl ReconciliationResult {
    /// Returns whether applying any policy would leave the store unchanged.
    pub fn is_noop(&self) -> bool {
        self.conflicts.is_empty() && self.new_remote_only.is_empty()
    }

    pub fn conflict_ids(&self) -> Vec<QuoteId> {
        self.conflicts
            .iter()
            .map(|conflict| conflict.local.id)
            .collect()
    }
}

/// How conflicting and remote-only quotes are folded into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Remote versions replace local ones; local-only quotes are kept.
    #[default]
    ServerWins,
    /// Local versions are kept; only remote-only quotes are appended.
    LocalWins,
    /// Conflicting text is taken from remote, every other local field kept.
    Merge,
}

impl ResolutionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServerWins => "server-wins",
            Self::LocalWins => "local-wins",
            Self::Merge => "merge",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownPolicy> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "server-wins" | "server" => Ok(Self::ServerWins),
            "local-wins" | "local" => Ok(Self::LocalWins),
            "merge" => Ok(Self::Merge),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }

    /// Computes the resolved quote sequence.
    ///
    /// `result` must come from `reconcile(local, remote)` for the same inputs.
    pub fn apply(
        self,
        local: &[Quote],
        remote: &[Quote],
        result: &ReconciliationResult,
    ) -> Vec<Quote> {
        match self {
            Self::ServerWins => {
                let remote = dedup_remote(remote);
                let remote_ids: HashSet<QuoteId> = remote.iter().map(|quote| quote.id).collect();
                let mut resolved: Vec<Quote> = remote.into_iter().cloned().collect();
                resolved.extend(
                    local
                        .iter()
                        .filter(|quote| !remote_ids.contains(&quote.id))
                        .cloned(),
                );
                resolved
            }
            Self::LocalWins => {
                let mut resolved = local.to_vec();
                resolved.extend(result.new_remote_only.iter().cloned());
                resolved
            }
            Self::Merge => {
                let remote_text: HashMap<QuoteId, &str> = result
                    .conflicts
                    .iter()
                    .map(|conflict| (conflict.local.id, conflict.remote.text.as_str()))
                    .collect();
                let mut resolved: Vec<Quote> = local
                    .iter()
                    .map(|quote| match remote_text.get(&quote.id) {
                        Some(text) => Quote {
                            text: (*text).to_string(),
                            ..quote.clone()
                        },
                        None => quote.clone(),
                    })
                    .collect();
                resolved.extend(result.new_remote_only.iter().cloned());
                resolved
            }
        }
    }
}

/// Returned by [`ResolutionPolicy::parse`] for unsupported labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl Display for UnknownPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported resolution policy `{}`; expected server-wins|local-wins|merge",
            self.0
        )
    }
}

impl Error for UnknownPolicy {}

/// Classifies `remote` against `local` by id.
pub fn reconcile(local: &[Quote], remote: &[Quote]) -> ReconciliationResult {
    let local_by_id: HashMap<QuoteId, &Quote> =
        local.iter().map(|quote| (quote.id, quote)).collect();
    let remote = dedup_remote(remote);
    let remote_ids: HashSet<QuoteId> = remote.iter().map(|quote| quote.id).collect();

    let mut result = ReconciliationResult::default();
    for remote_quote in remote {
        match local_by_id.get(&remote_quote.id) {
            Some(local_quote) if !local_quote.same_content(remote_quote) => {
                result.conflicts.push(Conflict {
                    local: (*local_quote).clone(),
                    remote: remote_quote.clone(),
                });
            }
            Some(_) => {}
            None => result.new_remote_only.push(remote_quote.clone()),
        }
    }
    result.local_only = local
        .iter()
        .filter(|quote| !remote_ids.contains(&quote.id))
        .cloned()
        .collect();
    result
}

/// Keeps the last occurrence of each id, at the position of its first one.
fn dedup_remote(remote: &[Quote]) -> Vec<&Quote> {
    let mut last_by_id: HashMap<QuoteId, &Quote> = HashMap::new();
    for quote in remote {
        last_by_id.insert(quote.id, quote);
    }
    let mut emitted = HashSet::new();
    remote
        .iter()
        .filter(|quote| emitted.insert(quote.id))
        .filter_map(|quote| last_by_id.get(&quote.id).copied())
        .collect()
}
