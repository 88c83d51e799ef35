mod common;

use common::{memory_persistence, FailingStore, ScriptedRemote};
use quotebox_core::storage::persistence::QUOTES_KEY;
use quotebox_core::{
    FilterPreference, KeyValueStore, MemoryKeyValueStore, NewQuote, NoticeLevel,
    PersistenceAdapter, Quote, QuoteSession, QuoteSource, RemoteSyncAdapter, SortOrder,
    SqliteKeyValueStore,
};
use quotebox_core::storage::Snapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

fn sqlite_persistence(path: &Path) -> PersistenceAdapter {
    PersistenceAdapter::new(
        Box::new(SqliteKeyValueStore::open(path).unwrap()),
        Box::new(MemoryKeyValueStore::new()),
    )
}

fn open(persistence: PersistenceAdapter) -> QuoteSession {
    QuoteSession::open(
        persistence,
        RemoteSyncAdapter::new(ScriptedRemote::serving(Vec::new())),
    )
}

#[test]
fn snapshot_round_trips_through_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotebox.db");

    let added = {
        let mut session = open(sqlite_persistence(&path));
        let id = session
            .add_quote(&NewQuote::new("Persist me", Some("Ada"), "Memory"))
            .unwrap();
        session.apply_filter(FilterPreference::new("Memory", SortOrder::Newest));
        id
    };

    let session = open(sqlite_persistence(&path));
    let restored = session.store().get(added).unwrap();
    assert_eq!(restored.text, "Persist me");
    assert_eq!(restored.author.as_deref(), Some("Ada"));
    assert!(session.categories().iter().any(|c| c == "Memory"));
    assert_eq!(session.preference().category, "Memory");
    assert_eq!(session.preference().sort_order, SortOrder::Newest);
    assert_eq!(session.quotes().len(), 9);
}

#[test]
fn empty_storage_loads_defaults_and_saves_them() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotebox.db");
    assert!(sqlite_persistence(&path).load().is_none());

    let first = open(sqlite_persistence(&path));
    assert_eq!(first.quotes().len(), 8);
    assert!(first
        .quotes()
        .iter()
        .all(|quote| quote.source == QuoteSource::Default));
    assert_eq!(first.categories().len(), 8);
    let defaults = first.quotes().to_vec();
    drop(first);

    let reopened = open(sqlite_persistence(&path));
    assert_eq!(reopened.quotes(), defaults.as_slice());
}

#[test]
fn malformed_snapshot_is_treated_as_absent() {
    let mut durable = MemoryKeyValueStore::new();
    durable.set(QUOTES_KEY, "{not json").unwrap();
    let persistence = PersistenceAdapter::new(Box::new(durable), Box::new(MemoryKeyValueStore::new()));
    assert!(persistence.load().is_none());

    let session = open(persistence);
    assert_eq!(session.quotes().len(), 8);
}

#[test]
fn invalid_and_repeated_quotes_are_dropped_on_load() {
    let good = Quote::new(1, "fine", None, "Life", QuoteSource::Local);
    let repeated = Quote::new(1, "same id", None, "Life", QuoteSource::Local);
    let blank = Quote::new(2, "   ", None, "Life", QuoteSource::Local);

    let mut persistence = memory_persistence();
    persistence
        .save(&Snapshot {
            quotes: vec![good.clone(), repeated, blank],
            ..Snapshot::default()
        })
        .unwrap();

    let snapshot = persistence.load().unwrap();
    assert_eq!(snapshot.quotes, vec![good]);
}

#[test]
fn failing_storage_never_aborts_the_session() {
    let persistence = PersistenceAdapter::new(Box::new(FailingStore), Box::new(FailingStore));
    let mut session = open(persistence);

    assert_eq!(session.quotes().len(), 8);
    let notices = session.drain_notices();
    assert!(notices
        .iter()
        .any(|notice| notice.level == NoticeLevel::Warning));

    let id = session
        .add_quote(&NewQuote::new("Still works", None, "Life"))
        .unwrap();
    assert!(session.store().get(id).is_some());
    let notices = session.drain_notices();
    assert!(notices
        .iter()
        .any(|notice| notice.level == NoticeLevel::Warning));
    assert!(notices
        .iter()
        .any(|notice| notice.level == NoticeLevel::Success));

    let mut rng = StdRng::seed_from_u64(1);
    assert!(session.show_random_quote(&mut rng).quote().is_some());
    assert!(session.last_viewed().is_none());
}

#[test]
fn last_viewed_lives_in_session_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotebox.db");
    let mut rng = StdRng::seed_from_u64(9);

    let shown = {
        let mut session = open(sqlite_persistence(&path));
        let shown = session.show_random_quote(&mut rng).quote().cloned().unwrap();
        assert_eq!(session.last_viewed(), Some(shown.clone()));
        shown
    };

    let session = open(sqlite_persistence(&path));
    assert!(session.last_viewed().is_none());
    assert!(session.store().get(shown.id).is_some());
}

#[test]
fn reset_clears_storage_and_reloads_defaults() {
    let mut session = open(memory_persistence());
    session
        .add_quote(&NewQuote::new("Temporary", None, "Scratch"))
        .unwrap();
    session.apply_filter(FilterPreference::new("Scratch", SortOrder::Author));

    session.reset_to_defaults();

    assert_eq!(session.quotes().len(), 8);
    assert!(!session.categories().iter().any(|c| c == "Scratch"));
    assert_eq!(session.preference(), &FilterPreference::default());
}
