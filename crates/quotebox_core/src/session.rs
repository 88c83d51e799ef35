//! Session context tying store, persistence, sync and presentation together.
//!
//! # Responsibility
//! - Own the quote store for one running session (no ambient globals).
//! - Recompute categories and persist a snapshot after every mutation.
//! - Convert non-fatal failures into notices at this boundary.
//! - Drive manual and timer-driven sync cycles.
//!
//! # Invariants
//! - Storage failures never abort an operation; the in-memory store stays
//!   authoritative and a warning notice is queued.
//! - Results of a cancelled or disabled sync cycle are never applied.
//! - `AutoSyncHandle::stop` must not be called while holding the session lock.

use crate::config::SyncConfig;
use crate::error::{NetworkError, QuoteError, QuoteResult};
use crate::model::preference::FilterPreference;
use crate::model::quote::{NewQuote, Quote, QuoteId};
use crate::presentation::{pick_random, Notice, QuoteStats, RenderedQuote};
use crate::storage::persistence::{PersistenceAdapter, Snapshot};
use crate::store::category_index::CategoryIndex;
use crate::store::defaults::default_quotes;
use crate::store::quote_store::{ImportReport, QuoteStore};
use crate::sync::auto_sync::AutoSync;
use crate::sync::engine::{SyncEngine, SyncState, SyncTicket};
use crate::sync::reconcile::{reconcile, ReconciliationResult, ResolutionPolicy};
use crate::sync::remote::RemoteSyncAdapter;
use crate::transfer::{parse_import, ExportDocument};
use log::{debug, info, warn};
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Session shared with the auto-sync thread.
pub type SharedSession = Arc<Mutex<QuoteSession>>;

/// Summary of one applied sync resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub policy: ResolutionPolicy,
    pub conflicts: usize,
    /// Remote-only quotes that entered the store.
    pub added: usize,
    pub local_only: usize,
    /// Store size after resolution.
    pub total: usize,
}

#[derive(Debug, Clone)]
struct PendingReview {
    remote: Vec<Quote>,
}

pub struct QuoteSession {
    session_id: Uuid,
    store: QuoteStore,
    categories: CategoryIndex,
    preference: FilterPreference,
    persistence: PersistenceAdapter,
    remote: RemoteSyncAdapter,
    engine: SyncEngine,
    pending_review: Option<PendingReview>,
    auto_sync_enabled: bool,
    notices: Vec<Notice>,
}

impl QuoteSession {
    /// Loads the persisted snapshot, falling back to the default quote set.
    pub fn open(persistence: PersistenceAdapter, remote: RemoteSyncAdapter) -> Self {
        let session_id = Uuid::new_v4();
        let snapshot = persistence.load();
        let preference = snapshot
            .as_ref()
            .map(|snapshot| snapshot.preference.clone())
            .or_else(|| persistence.load_preference())
            .unwrap_or_default();
        let quotes = snapshot.map(|snapshot| snapshot.quotes).unwrap_or_default();

        let mut session = Self {
            session_id,
            store: QuoteStore::from_quotes(quotes),
            categories: CategoryIndex::default(),
            preference,
            persistence,
            remote,
            engine: SyncEngine::new(),
            pending_review: None,
            auto_sync_enabled: false,
            notices: Vec::new(),
        };

        if session.store.is_empty() {
            session.load_defaults();
        } else {
            session.categories.recompute(session.store.all());
        }
        info!(
            "event=session_open module=session status=ok session_id={} quotes={} categories={}",
            session.session_id,
            session.store.len(),
            session.categories.len()
        );
        session
    }

    /// Wraps the session for use with [`start_auto_sync`].
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn quotes(&self) -> &[Quote] {
        self.store.all()
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn categories(&self) -> &[String] {
        self.categories.as_slice()
    }

    pub fn preference(&self) -> &FilterPreference {
        &self.preference
    }

    pub fn sync_state(&self) -> SyncState {
        self.engine.state()
    }

    pub fn last_sync_error(&self) -> Option<&str> {
        self.engine.last_error()
    }

    pub fn last_viewed(&self) -> Option<Quote> {
        self.persistence.load_last_viewed()
    }

    pub fn auto_sync_enabled(&self) -> bool {
        self.auto_sync_enabled
    }

    pub fn has_pending_review(&self) -> bool {
        self.pending_review.is_some()
    }

    /// Takes every queued notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn stats(&self) -> QuoteStats {
        QuoteStats {
            total: self.store.len(),
            filtered: self.store.by_category(&self.preference.category).len(),
            categories: self.categories.len(),
        }
    }

    /// Picks a random quote within the active category filter.
    ///
    /// An empty store is refilled with defaults first. The pick is remembered
    /// in the session namespace.
    pub fn show_random_quote<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RenderedQuote {
        if self.store.is_empty() {
            self.load_defaults();
        }
        let candidates = self.store.filtered(&self.preference);
        let picked = pick_random(&candidates, rng).cloned();
        match picked {
            Some(quote) => {
                if let Err(err) = self.persistence.save_last_viewed(&quote) {
                    warn!(
                        "event=last_viewed_save module=session status=error session_id={} error={}",
                        self.session_id, err
                    );
                }
                RenderedQuote::Quote(quote)
            }
            None => RenderedQuote::Empty {
                category: self.preference.category.clone(),
            },
        }
    }

    /// Filtered quotes ordered by the active sort order.
    pub fn sorted_quotes<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Quote> {
        self.store.sorted(&self.preference, rng)
    }

    /// Replaces the active filter and persists it.
    pub fn apply_filter(&mut self, preference: FilterPreference) {
        self.preference = preference;
        if let Err(err) = self.persistence.save_preference(&self.preference) {
            self.storage_warning("preference_save", &err.into());
        }
        info!(
            "event=filter_apply module=session status=ok session_id={} category_is_all={} sort={}",
            self.session_id,
            self.preference.is_unfiltered(),
            self.preference.sort_order.as_str()
        );
    }

    /// Adds a local quote.
    ///
    /// # Errors
    /// - `QuoteError::Validation` / `QuoteError::Duplicate` from the store;
    ///   the store is unchanged in both cases.
    pub fn add_quote(&mut self, draft: &NewQuote) -> QuoteResult<QuoteId> {
        let id = self.store.add(draft)?;
        self.after_mutation();
        self.notices.push(Notice::success("Quote added successfully!"));
        info!(
            "event=quote_add module=session status=ok session_id={} total={}",
            self.session_id,
            self.store.len()
        );
        Ok(id)
    }

    pub fn remove_quote(&mut self, id: QuoteId) -> QuoteResult<Quote> {
        let removed = self.store.remove(id)?;
        self.after_mutation();
        self.notices.push(Notice::success("Quote removed."));
        Ok(removed)
    }

    /// Imports a JSON document (bare array or `{ "quotes": [...] }`).
    pub fn import_json(&mut self, input: &str) -> QuoteResult<ImportReport> {
        let batch = parse_import(input)?;
        let mut report = self.store.append_imported(batch.records);
        report.invalid += batch.malformed;
        if report.imported_count() > 0 {
            self.after_mutation();
            self.notices.push(Notice::success(format!(
                "{} quotes imported successfully!",
                report.imported_count()
            )));
        } else {
            self.notices
                .push(Notice::info("No new quotes found in the import file."));
        }
        info!(
            "event=quote_import module=session status=ok session_id={} imported={} duplicates={} invalid={}",
            self.session_id,
            report.imported_count(),
            report.duplicates,
            report.invalid
        );
        Ok(report)
    }

    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(self.store.all(), self.categories.as_slice())
    }

    pub fn export_json(&self) -> QuoteResult<Vec<u8>> {
        self.export_document().to_json_bytes()
    }

    /// Runs a full fetch + reconcile + resolve cycle on the calling thread.
    pub fn sync_now(&mut self, policy: ResolutionPolicy) -> QuoteResult<SyncReport> {
        let ticket = self.begin_sync()?;
        match self.remote.try_fetch() {
            Ok(remote) => self.complete_sync(ticket, remote, policy),
            Err(err) => Err(self.fail_sync(ticket, err)),
        }
    }

    /// Fetches and classifies remote quotes without touching the store.
    ///
    /// The fetched list is kept until [`QuoteSession::resolve_pending`].
    pub fn review_remote(&mut self) -> QuoteResult<ReconciliationResult> {
        let ticket = self.begin_sync()?;
        let remote = match self.remote.try_fetch() {
            Ok(remote) => remote,
            Err(err) => return Err(self.fail_sync(ticket, err)),
        };
        self.engine.start_reconciling(ticket)?;
        let result = reconcile(self.store.all(), &remote);
        self.engine.finish(ticket)?;

        if !result.conflicts.is_empty() {
            self.notices.push(Notice::warning(format!(
                "{} conflicts found; choose server-wins, local-wins or merge.",
                result.conflicts.len()
            )));
        }
        self.pending_review = Some(PendingReview { remote });
        Ok(result)
    }

    /// Applies `policy` to the last reviewed remote list.
    ///
    /// Classification is redone against the current store, so local edits
    /// made after the review are respected.
    pub fn resolve_pending(&mut self, policy: ResolutionPolicy) -> QuoteResult<SyncReport> {
        let pending = self
            .pending_review
            .take()
            .ok_or(QuoteError::NoPendingReview)?;
        Ok(self.apply_resolution(&pending.remote, policy))
    }

    /// Starts a cycle; used by callers that fetch outside the session lock.
    pub fn begin_sync(&mut self) -> QuoteResult<SyncTicket> {
        self.engine.begin().inspect_err(|err| {
            self.notices.push(Notice::from_error(err));
        })
    }

    /// Applies fetched quotes for a cycle started with [`QuoteSession::begin_sync`].
    ///
    /// # Errors
    /// - `QuoteError::SyncCancelled` when the cycle was cancelled meanwhile;
    ///   the store is untouched.
    pub fn complete_sync(
        &mut self,
        ticket: SyncTicket,
        remote: Vec<Quote>,
        policy: ResolutionPolicy,
    ) -> QuoteResult<SyncReport> {
        if let Err(err) = self.engine.start_reconciling(ticket) {
            info!(
                "event=sync_apply module=session status=discarded session_id={} generation={}",
                self.session_id,
                ticket.generation()
            );
            return Err(err);
        }
        let report = self.apply_resolution(&remote, policy);
        self.engine.finish(ticket)?;
        Ok(report)
    }

    /// Records a fetch failure for a running cycle and returns it as an error.
    pub fn fail_sync(&mut self, ticket: SyncTicket, err: NetworkError) -> QuoteError {
        self.engine.fail(ticket, err.to_string());
        let err = QuoteError::Network(err);
        self.notices.push(Notice::from_error(&err));
        err
    }

    /// Invalidates any running cycle; returns whether one was running.
    pub fn cancel_sync(&mut self) -> bool {
        self.engine.cancel_in_flight()
    }

    /// Pushes local quotes and tags the accepted ones `synced`.
    pub fn push_local(&mut self) -> usize {
        let accepted = self.remote.push_local(self.store.all());
        let updated = self.store.mark_synced(&accepted);
        if updated > 0 {
            self.after_mutation();
            self.notices
                .push(Notice::success(format!("{updated} quotes pushed to server.")));
        }
        updated
    }

    /// Clears persisted data and reinstalls the default quote set.
    pub fn reset_to_defaults(&mut self) {
        if let Err(err) = self.persistence.clear_all() {
            self.storage_warning("storage_clear", &err.into());
        }
        self.preference = FilterPreference::default();
        self.pending_review = None;
        self.store.clear();
        self.load_defaults();
        self.notices
            .push(Notice::info("All data cleared. Default quotes loaded."));
    }

    fn apply_resolution(&mut self, remote: &[Quote], policy: ResolutionPolicy) -> SyncReport {
        let result = reconcile(self.store.all(), remote);
        let resolved = policy.apply(self.store.all(), remote, &result);
        let before: std::collections::HashSet<QuoteId> =
            self.store.all().iter().map(|quote| quote.id).collect();
        self.store.replace_all(resolved);
        self.after_mutation();

        let added = self
            .store
            .all()
            .iter()
            .filter(|quote| !before.contains(&quote.id))
            .count();
        let report = SyncReport {
            policy,
            conflicts: result.conflicts.len(),
            added,
            local_only: result.local_only.len(),
            total: self.store.len(),
        };
        info!(
            "event=sync_apply module=session status=ok session_id={} policy={} conflicts={} added={} local_only={} total={}",
            self.session_id,
            policy.as_str(),
            report.conflicts,
            report.added,
            report.local_only,
            report.total
        );
        self.notices.push(Notice::success(format!(
            "Synced with server ({}): {} new, {} conflicts resolved.",
            policy.as_str(),
            report.added,
            report.conflicts
        )));
        report
    }

    fn load_defaults(&mut self) {
        let defaults = default_quotes(self.store.id_generator());
        self.store.replace_all(defaults);
        self.after_mutation();
        info!(
            "event=defaults_load module=session status=ok session_id={} quotes={}",
            self.session_id,
            self.store.len()
        );
    }

    fn after_mutation(&mut self) {
        self.categories.recompute(self.store.all());
        let snapshot = Snapshot {
            quotes: self.store.all().to_vec(),
            categories: self.categories.as_slice().to_vec(),
            preference: self.preference.clone(),
        };
        if let Err(err) = self.persistence.save(&snapshot) {
            self.storage_warning("snapshot_save", &err.into());
        }
    }

    fn storage_warning(&mut self, event: &str, err: &QuoteError) {
        warn!(
            "event={event} module=session status=error session_id={} error={}",
            self.session_id, err
        );
        self.notices.push(Notice::from_error(err));
    }
}

/// Running auto-sync bound to a shared session.
pub struct AutoSyncHandle {
    session: SharedSession,
    timer: AutoSync,
}

impl AutoSyncHandle {
    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn ticks(&self) -> u64 {
        self.timer.ticks()
    }

    /// Disables auto-sync, cancels the in-flight cycle and stops the timer.
    ///
    /// Must not be called while the caller holds the session lock.
    pub fn stop(&mut self) {
        if !self.timer.is_running() {
            return;
        }
        {
            let mut session = lock_session(&self.session);
            session.auto_sync_enabled = false;
            session.cancel_sync();
        }
        self.timer.stop();
    }
}

impl Drop for AutoSyncHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts timer-driven sync for `session` using `config.interval` and
/// `config.policy`.
///
/// The remote fetch runs without holding the session lock; results are applied
/// only if auto-sync is still enabled and the cycle was not cancelled.
pub fn start_auto_sync(
    session: &SharedSession,
    config: &SyncConfig,
) -> std::io::Result<AutoSyncHandle> {
    lock_session(session).auto_sync_enabled = true;

    let task_session = Arc::clone(session);
    let policy = config.policy;
    let timer = AutoSync::start(config.interval, move || {
        let outcome = run_auto_sync_tick(&task_session, policy);
        debug!(
            "event=auto_sync_tick module=session status={}",
            tick_status(&outcome)
        );
    })?;

    Ok(AutoSyncHandle {
        session: Arc::clone(session),
        timer,
    })
}

fn tick_status(outcome: &Option<QuoteResult<SyncReport>>) -> &'static str {
    match outcome {
        None => "skipped",
        Some(Ok(_)) => "ok",
        Some(Err(QuoteError::SyncCancelled)) => "cancelled",
        Some(Err(QuoteError::SyncBusy(_))) => "busy",
        Some(Err(_)) => "error",
    }
}

/// One auto-sync cycle; `None` when auto-sync was disabled before it began.
pub fn run_auto_sync_tick(
    session: &SharedSession,
    policy: ResolutionPolicy,
) -> Option<QuoteResult<SyncReport>> {
    let (ticket, remote) = {
        let mut guard = lock_session(session);
        if !guard.auto_sync_enabled {
            return None;
        }
        match guard.begin_sync() {
            Ok(ticket) => (ticket, guard.remote.clone()),
            Err(err) => return Some(Err(err)),
        }
    };

    let fetched = remote.try_fetch();

    let mut guard = lock_session(session);
    if !guard.auto_sync_enabled {
        guard.cancel_sync();
        return Some(Err(QuoteError::SyncCancelled));
    }
    Some(match fetched {
        Ok(quotes) => guard.complete_sync(ticket, quotes, policy),
        Err(err) => Err(guard.fail_sync(ticket, err)),
    })
}

fn lock_session(session: &SharedSession) -> MutexGuard<'_, QuoteSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{tick_status, SyncReport};
    use crate::error::QuoteError;
    use crate::sync::engine::SyncState;
    use crate::sync::reconcile::ResolutionPolicy;

    #[test]
    fn tick_status_names_every_outcome() {
        let report = SyncReport {
            policy: ResolutionPolicy::Merge,
            conflicts: 0,
            added: 1,
            local_only: 0,
            total: 9,
        };
        assert_eq!(tick_status(&None), "skipped");
        assert_eq!(tick_status(&Some(Ok(report))), "ok");
        assert_eq!(tick_status(&Some(Err(QuoteError::SyncCancelled))), "cancelled");
        assert_eq!(
            tick_status(&Some(Err(QuoteError::SyncBusy(SyncState::Fetching)))),
            "busy"
        );
        assert_eq!(tick_status(&Some(Err(QuoteError::NoPendingReview))), "error");
    }
}
