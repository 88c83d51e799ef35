#![allow(dead_code)]

use quotebox_core::storage::kv_store::StorageResult;
use quotebox_core::{
    KeyValueStore, MemoryKeyValueStore, NetworkError, PersistenceAdapter, Quote, QuoteId,
    QuoteSession, QuoteSource, RemoteQuoteSource, RemoteSyncAdapter, StorageError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted remote: serves `quotes` or fails, counts calls, can block fetches.
#[derive(Default)]
pub struct ScriptedRemote {
    pub quotes: Mutex<Vec<Quote>>,
    pub fail_with: Mutex<Option<NetworkError>>,
    pub fetches: AtomicUsize,
    pub pushed: Mutex<Vec<Quote>>,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl ScriptedRemote {
    pub fn serving(quotes: Vec<Quote>) -> Arc<Self> {
        Arc::new(Self {
            quotes: Mutex::new(quotes),
            ..Self::default()
        })
    }

    /// Every fetch signals `entered` and then waits for one message on `release`.
    pub fn gated(quotes: Vec<Quote>, entered: Sender<()>, release: Receiver<()>) -> Arc<Self> {
        Arc::new(Self {
            quotes: Mutex::new(quotes),
            gate: Mutex::new(Some((entered, release))),
            ..Self::default()
        })
    }

    pub fn fail(&self, err: NetworkError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RemoteQuoteSource for ScriptedRemote {
    fn source_id(&self) -> &str {
        "scripted"
    }

    fn fetch(&self) -> Result<Vec<Quote>, NetworkError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = self.gate.lock().unwrap().as_ref() {
            let _ = entered.send(());
            let _ = release.recv_timeout(Duration::from_secs(5));
        }
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.quotes.lock().unwrap().clone())
    }

    fn push(&self, quotes: &[Quote]) -> Result<Vec<QuoteId>, NetworkError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.pushed.lock().unwrap().extend(quotes.iter().cloned());
        Ok(quotes.iter().map(|quote| quote.id).collect())
    }
}

/// Key-value store whose every call fails.
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("disk on fire".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&mut self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("read-only".to_string()))
    }
}

pub fn memory_persistence() -> PersistenceAdapter {
    PersistenceAdapter::new(
        Box::new(MemoryKeyValueStore::new()),
        Box::new(MemoryKeyValueStore::new()),
    )
}

pub fn session_with(remote: Arc<ScriptedRemote>) -> QuoteSession {
    QuoteSession::open(memory_persistence(), RemoteSyncAdapter::new(remote))
}

pub fn offline_session() -> QuoteSession {
    session_with(ScriptedRemote::serving(Vec::new()))
}

pub fn server_quote(id: QuoteId, text: &str, category: &str) -> Quote {
    Quote::new(
        id,
        text,
        Some(format!("User {}", id % 10)),
        category,
        QuoteSource::Server,
    )
}
