//! Error taxonomy for quote operations.
//!
//! # Responsibility
//! - Name every failure a session operation can surface.
//! - Keep storage and network failures distinguishable for notices.
//!
//! # Invariants
//! - None of these errors is fatal for a running session; callers convert
//!   them into notices at the session boundary.

use crate::db::DbError;
use crate::model::quote::{QuoteId, QuoteValidationError};
use crate::sync::engine::SyncState;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QuoteResult<T> = Result<T, QuoteError>;

/// Failure of one quote use-case.
#[derive(Debug)]
pub enum QuoteError {
    /// Required field missing or blank.
    Validation(QuoteValidationError),
    /// Same `text` + `author` already present.
    Duplicate {
        text: String,
        author: Option<String>,
    },
    NotFound(QuoteId),
    /// Import payload is not valid JSON or has the wrong shape.
    Import(String),
    Storage(StorageError),
    Network(NetworkError),
    /// A sync cycle is already running.
    SyncBusy(SyncState),
    /// Results of a cancelled sync cycle were discarded.
    SyncCancelled,
    /// `resolve_pending` called without a prior remote review.
    NoPendingReview,
}

impl Display for QuoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { text, author } => write!(
                f,
                "quote already exists: \"{text}\" by {}",
                author.as_deref().unwrap_or("Unknown")
            ),
            Self::NotFound(id) => write!(f, "quote not found: {id}"),
            Self::Import(message) => write!(f, "import failed: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Network(err) => write!(f, "{err}"),
            Self::SyncBusy(state) => {
                write!(f, "sync already in progress (state={})", state.as_str())
            }
            Self::SyncCancelled => write!(f, "sync cancelled; late results discarded"),
            Self::NoPendingReview => write!(f, "no pending remote review to resolve"),
        }
    }
}

impl Error for QuoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QuoteValidationError> for QuoteError {
    fn from(value: QuoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for QuoteError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<NetworkError> for QuoteError {
    fn from(value: NetworkError) -> Self {
        Self::Network(value)
    }
}

/// Key-value persistence failure.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Stored value could not be encoded or decoded.
    Serialization {
        key: String,
        message: String,
    },
    /// Backend refused the operation (e.g. quota, read-only medium).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "storage error: {err}"),
            Self::Serialization { key, message } => {
                write!(f, "storage value `{key}` is malformed: {message}")
            }
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Remote endpoint failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Endpoint answered with a non-success status.
    Status { code: u16, url: String },
    /// Connection, DNS or TLS failure.
    Transport(String),
    /// Response body was not the expected JSON shape.
    Decode(String),
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { code, url } => write!(f, "remote returned HTTP {code} for {url}"),
            Self::Transport(message) => write!(f, "remote unreachable: {message}"),
            Self::Decode(message) => write!(f, "remote response malformed: {message}"),
        }
    }
}

impl Error for NetworkError {}
