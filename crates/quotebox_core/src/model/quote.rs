//! Quote record, draft input and identifier generation.
//!
//! # Responsibility
//! - Define the one `Quote` shape shared by store, persistence, sync and export.
//! - Normalize loose import/remote records into valid quotes.
//! - Hand out collision-free identifiers for locally created quotes.
//!
//! # Invariants
//! - `text`, `category` and `timestamp` are non-blank on every valid quote.
//! - A blank `author` is represented as `None`, never as an empty string.
//! - `id` is at most `MAX_QUOTE_ID`; imported ids above it are replaced.
//! - `QuoteIdGenerator::next` is strictly increasing within one generator.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Stable identifier for one quote inside a store.
pub type QuoteId = i64;

/// Category assigned to imported records that carry no category.
pub const DEFAULT_IMPORT_CATEGORY: &str = "General";

/// Display label used when a quote has no author.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Largest id a valid quote may carry; keeps `QuoteIdGenerator` clear of
/// integer overflow.
pub const MAX_QUOTE_ID: QuoteId = QuoteId::MAX / 2;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Provenance tag for a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Created in this session through the add form.
    Local,
    /// Fetched from the remote endpoint.
    Server,
    /// Part of the built-in default set.
    Default,
    /// Created locally and accepted by the remote endpoint.
    Synced,
}

impl QuoteSource {
    /// Stable lowercase label used in exports and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Server => "server",
            Self::Default => "default",
            Self::Synced => "synced",
        }
    }
}

/// Canonical quote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub category: String,
    pub source: QuoteSource,
    /// RFC 3339 timestamp of creation (or of arrival for remote quotes).
    pub timestamp: String,
}

/// Validation failures for quote fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteValidationError {
    BlankText,
    BlankCategory,
    BlankTimestamp,
    IdOutOfRange(QuoteId),
}

impl Display for QuoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText => write!(f, "quote text must not be blank"),
            Self::BlankCategory => write!(f, "quote category must not be blank"),
            Self::BlankTimestamp => write!(f, "quote timestamp must not be blank"),
            Self::IdOutOfRange(id) => write!(f, "quote id {id} is above {MAX_QUOTE_ID}"),
        }
    }
}

impl Error for QuoteValidationError {}

impl Quote {
    /// Builds a quote from already-normalized parts.
    ///
    /// The caller owns id uniqueness; use [`Quote::validate`] before storing.
    pub fn new(
        id: QuoteId,
        text: impl Into<String>,
        author: Option<String>,
        category: impl Into<String>,
        source: QuoteSource,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            author: normalize_author(author),
            category: category.into(),
            source,
            timestamp: now_timestamp(),
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), QuoteValidationError> {
        if self.text.trim().is_empty() {
            return Err(QuoteValidationError::BlankText);
        }
        if self.category.trim().is_empty() {
            return Err(QuoteValidationError::BlankCategory);
        }
        if self.timestamp.trim().is_empty() {
            return Err(QuoteValidationError::BlankTimestamp);
        }
        if self.id > MAX_QUOTE_ID {
            return Err(QuoteValidationError::IdOutOfRange(self.id));
        }
        Ok(())
    }

    /// Author label for display, `Unknown` when absent.
    pub fn author_or_unknown(&self) -> &str {
        self.author.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Returns whether user-visible content matches another quote.
    ///
    /// Compares `text`, `author` and `category`; identity and provenance are
    /// ignored.
    pub fn same_content(&self, other: &Quote) -> bool {
        self.text == other.text && self.author == other.author && self.category == other.category
    }

    /// Duplicate rule for add/import: same `text` and same `author`.
    pub fn is_duplicate_of(&self, text: &str, author: Option<&str>) -> bool {
        self.text == text && self.author.as_deref() == author
    }

    /// Converts one loose record into a quote, applying every default once.
    ///
    /// # Contract
    /// - Blank or missing text is rejected.
    /// - Missing, taken or out-of-range ids are replaced by `ids.next()`.
    /// - Missing category becomes [`DEFAULT_IMPORT_CATEGORY`].
    /// - Missing source becomes `Local`; missing timestamp becomes now.
    pub fn from_record(
        record: QuoteRecord,
        ids: &mut QuoteIdGenerator,
        id_taken: impl Fn(QuoteId) -> bool,
    ) -> Result<Self, QuoteValidationError> {
        let text = record.text.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(QuoteValidationError::BlankText);
        }

        let id = match record.id {
            Some(id) if id <= MAX_QUOTE_ID && !id_taken(id) => {
                ids.observe(id);
                id
            }
            _ => ids.next(),
        };
        let category = record
            .category
            .as_deref()
            .map(normalize_category)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_IMPORT_CATEGORY.to_string());
        let timestamp = record
            .timestamp
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(now_timestamp);

        let quote = Self {
            id,
            text: text.to_string(),
            author: normalize_author(record.author),
            category,
            source: record.source.unwrap_or(QuoteSource::Local),
            timestamp,
        };
        quote.validate()?;
        Ok(quote)
    }
}

/// Loose quote-shaped input from import files.
///
/// Every field is optional; [`Quote::from_record`] decides the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    #[serde(default)]
    pub id: Option<QuoteId>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<QuoteSource>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<Quote> for QuoteRecord {
    fn from(value: Quote) -> Self {
        Self {
            id: Some(value.id),
            text: Some(value.text),
            author: value.author,
            category: Some(value.category),
            source: Some(value.source),
            timestamp: Some(value.timestamp),
        }
    }
}

/// Add-form input for a new local quote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewQuote {
    pub text: String,
    pub author: Option<String>,
    pub category: String,
}

impl NewQuote {
    pub fn new(
        text: impl Into<String>,
        author: Option<&str>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            author: author.map(str::to_string),
            category: category.into(),
        }
    }

    /// Returns trimmed `(text, author, category)`.
    pub fn normalized(&self) -> (String, Option<String>, String) {
        (
            self.text.trim().to_string(),
            normalize_author(self.author.clone()),
            normalize_category(&self.category),
        )
    }
}

/// Monotonic identifier source for locally created quotes.
///
/// Seeds from wall-clock milliseconds but never repeats or goes backwards,
/// even for many calls inside the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct QuoteIdGenerator {
    last: QuoteId,
}

impl QuoteIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id strictly greater than every id seen so far.
    pub fn next(&mut self) -> QuoteId {
        let candidate = match self.last.checked_add(1) {
            Some(after_last) => now_millis().max(after_last),
            // Out of range; `Quote::validate` rejects it.
            None => QuoteId::MAX,
        };
        self.last = candidate;
        candidate
    }

    /// Records an externally assigned id so later ids stay above it.
    pub fn observe(&mut self, id: QuoteId) {
        if id > self.last && id <= MAX_QUOTE_ID {
            self.last = id;
        }
    }
}

/// Current time as an RFC 3339 string.
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

/// Parses an RFC 3339 timestamp, `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).ok()
}

/// Trims a category label and collapses inner whitespace runs.
pub fn normalize_category(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

fn normalize_author(author: Option<String>) -> Option<String> {
    author
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn now_millis() -> QuoteId {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    QuoteId::try_from(nanos / 1_000_000).unwrap_or(QuoteId::MAX)
}
