mod common;

use common::{memory_persistence, server_quote, session_with, ScriptedRemote};
use quotebox_core::session::run_auto_sync_tick;
use quotebox_core::{
    NetworkError, NewQuote, Quote, QuoteError, QuoteSession, QuoteSource, RemoteSyncAdapter,
    ResolutionPolicy, SyncState,
};
use quotebox_core::storage::Snapshot;
use quotebox_core::FilterPreference;

/// Session whose store holds exactly `quotes`.
fn session_holding(quotes: Vec<Quote>, remote: std::sync::Arc<ScriptedRemote>) -> QuoteSession {
    let mut persistence = memory_persistence();
    persistence
        .save(&Snapshot {
            quotes,
            categories: Vec::new(),
            preference: FilterPreference::default(),
        })
        .unwrap();
    QuoteSession::open(persistence, RemoteSyncAdapter::new(remote))
}

fn local(id: i64, text: &str) -> Quote {
    Quote::new(id, text, Some("Local".to_string()), "Life", QuoteSource::Local)
}

#[test]
fn server_wins_replaces_conflicting_text() {
    let remote = ScriptedRemote::serving(vec![Quote {
        source: QuoteSource::Server,
        text: "B".to_string(),
        ..local(1, "A")
    }]);
    let mut session = session_holding(vec![local(1, "A")], remote);

    let report = session.sync_now(ResolutionPolicy::ServerWins).unwrap();
    assert_eq!(report.conflicts, 1);
    assert_eq!(session.quotes().len(), 1);
    assert_eq!(session.quotes()[0].id, 1);
    assert_eq!(session.quotes()[0].text, "B");
    assert_eq!(session.sync_state(), SyncState::Done);
}

#[test]
fn local_wins_keeps_local_text() {
    let remote = ScriptedRemote::serving(vec![server_quote(1, "B", "Life")]);
    let mut session = session_holding(vec![local(1, "A")], remote);

    session.sync_now(ResolutionPolicy::LocalWins).unwrap();
    assert_eq!(session.quotes(), [local_with_timestamp(&session, 1, "A")]);
}

fn local_with_timestamp(session: &QuoteSession, id: i64, text: &str) -> Quote {
    Quote {
        timestamp: session.store().get(id).unwrap().timestamp.clone(),
        ..local(id, text)
    }
}

#[test]
fn merge_takes_remote_text_and_keeps_other_fields() {
    let remote = ScriptedRemote::serving(vec![server_quote(1, "B", "Wisdom")]);
    let original = local(1, "A");
    let mut session = session_holding(vec![original.clone()], remote);

    session.sync_now(ResolutionPolicy::Merge).unwrap();
    let merged = &session.quotes()[0];
    assert_eq!(merged.text, "B");
    assert_eq!(merged.author, original.author);
    assert_eq!(merged.category, original.category);
    assert_eq!(merged.source, original.source);
    assert_eq!(merged.timestamp, original.timestamp);
}

#[test]
fn new_remote_quotes_are_added_and_categories_refresh() {
    let remote = ScriptedRemote::serving(vec![
        server_quote(2, "two", "Life"),
        server_quote(3, "three", "Success"),
    ]);
    let mut session = session_holding(vec![local(1, "one"), local(2, "two")], remote);

    let report = session.sync_now(ResolutionPolicy::ServerWins).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.local_only, 1);
    assert_eq!(report.total, 3);
    assert!(session.categories().iter().any(|c| c == "Success"));
}

#[test]
fn network_failure_leaves_store_intact() {
    let remote = ScriptedRemote::serving(vec![server_quote(9, "never", "Life")]);
    remote.fail(NetworkError::Transport("connection refused".to_string()));
    let mut session = session_with(remote);
    let before = session.quotes().to_vec();
    session.drain_notices();

    let err = session.sync_now(ResolutionPolicy::ServerWins).unwrap_err();
    assert!(matches!(err, QuoteError::Network(_)));
    assert_eq!(session.quotes(), before.as_slice());
    assert_eq!(session.sync_state(), SyncState::Error);
    assert!(session.last_sync_error().is_some());
    assert_eq!(session.drain_notices().len(), 1);

    // The next cycle may start after an error.
    assert!(session.begin_sync().is_ok());
}

#[test]
fn overlapping_cycle_is_rejected() {
    let mut session = session_with(ScriptedRemote::serving(Vec::new()));
    let _ticket = session.begin_sync().unwrap();

    let err = session.sync_now(ResolutionPolicy::ServerWins).unwrap_err();
    assert!(matches!(err, QuoteError::SyncBusy(SyncState::Fetching)));
}

#[test]
fn cancelled_cycle_discards_late_results() {
    let mut session = session_with(ScriptedRemote::serving(Vec::new()));
    let before = session.quotes().to_vec();

    let ticket = session.begin_sync().unwrap();
    assert!(session.cancel_sync());
    let err = session
        .complete_sync(
            ticket,
            vec![server_quote(77, "late", "Life")],
            ResolutionPolicy::ServerWins,
        )
        .unwrap_err();

    assert!(matches!(err, QuoteError::SyncCancelled));
    assert_eq!(session.quotes(), before.as_slice());
}

#[test]
fn review_then_resolve_applies_chosen_policy() {
    let remote = ScriptedRemote::serving(vec![server_quote(1, "B", "Life")]);
    let mut session = session_holding(vec![local(1, "A")], remote);

    let review = session.review_remote().unwrap();
    assert_eq!(review.conflict_ids(), [1]);
    assert!(session.has_pending_review());
    assert_eq!(session.quotes()[0].text, "A");

    let report = session.resolve_pending(ResolutionPolicy::ServerWins).unwrap();
    assert_eq!(report.conflicts, 1);
    assert_eq!(session.quotes()[0].text, "B");

    let err = session
        .resolve_pending(ResolutionPolicy::ServerWins)
        .unwrap_err();
    assert!(matches!(err, QuoteError::NoPendingReview));
}

#[test]
fn push_marks_accepted_local_quotes_synced() {
    let remote = ScriptedRemote::serving(Vec::new());
    let mut session = session_with(remote.clone());
    let id = session
        .add_quote(&NewQuote::new("Share me", None, "Life"))
        .unwrap();

    assert_eq!(session.push_local(), 1);
    assert_eq!(session.store().get(id).unwrap().source, QuoteSource::Synced);
    let pushed = remote.pushed.lock().unwrap();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].id, id);
    drop(pushed);

    // Nothing local remains to push.
    assert_eq!(session.push_local(), 0);
}

#[test]
fn failed_push_changes_nothing() {
    let remote = ScriptedRemote::serving(Vec::new());
    let mut session = session_with(remote.clone());
    let id = session
        .add_quote(&NewQuote::new("Stay local", None, "Life"))
        .unwrap();
    remote.fail(NetworkError::Status {
        code: 503,
        url: "http://example.invalid".to_string(),
    });

    assert_eq!(session.push_local(), 0);
    assert_eq!(session.store().get(id).unwrap().source, QuoteSource::Local);
}

#[test]
fn tick_is_skipped_while_auto_sync_is_disabled() {
    let remote = ScriptedRemote::serving(vec![server_quote(5, "five", "Life")]);
    let shared = session_with(remote.clone()).into_shared();

    assert!(run_auto_sync_tick(&shared, ResolutionPolicy::ServerWins).is_none());
    assert_eq!(remote.fetch_count(), 0);
}
