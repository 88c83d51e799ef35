//! Ordered in-memory quote store.
//!
//! # Responsibility
//! - Validate and append new local quotes.
//! - Serve filtered and sorted views to presentation code.
//! - Merge imported records with duplicate and id-collision handling.
//!
//! # Invariants
//! - Every stored quote passes `Quote::validate()`.
//! - No two stored quotes share an id.
//! - Add/import reject a `text` + `author` pair that is already present.

use crate::error::{QuoteError, QuoteResult};
use crate::model::preference::{FilterPreference, SortOrder, ALL_CATEGORIES};
use crate::model::quote::{
    now_timestamp, parse_timestamp, NewQuote, Quote, QuoteId, QuoteIdGenerator, QuoteRecord,
    QuoteSource, QuoteValidationError,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Outcome of merging an import batch into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ids of quotes appended, in import order.
    pub imported: Vec<QuoteId>,
    /// Records skipped because `text` + `author` already existed.
    pub duplicates: usize,
    /// Records skipped because they were malformed or had blank required fields.
    pub invalid: usize,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

/// Session-owned ordered quote collection.
#[derive(Debug, Clone, Default)]
pub struct QuoteStore {
    quotes: Vec<Quote>,
    ids: QuoteIdGenerator,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already-validated quotes (e.g. a loaded snapshot).
    pub fn from_quotes(quotes: Vec<Quote>) -> Self {
        let mut store = Self::new();
        store.replace_all(quotes);
        store
    }

    /// Appends a new local quote.
    ///
    /// # Errors
    /// - `QuoteError::Validation` when text or category is blank after trim.
    /// - `QuoteError::Duplicate` when the same text + author already exists.
    pub fn add(&mut self, draft: &NewQuote) -> QuoteResult<QuoteId> {
        let (text, author, category) = draft.normalized();
        if text.is_empty() {
            return Err(QuoteValidationError::BlankText.into());
        }
        if category.is_empty() {
            return Err(QuoteValidationError::BlankCategory.into());
        }
        if self.has_duplicate(&text, author.as_deref()) {
            return Err(QuoteError::Duplicate { text, author });
        }

        let quote = Quote {
            id: self.ids.next(),
            text,
            author,
            category,
            source: QuoteSource::Local,
            timestamp: now_timestamp(),
        };
        quote.validate()?;
        let id = quote.id;
        self.quotes.push(quote);
        Ok(id)
    }

    /// Removes one quote by id and returns it.
    pub fn remove(&mut self, id: QuoteId) -> QuoteResult<Quote> {
        let position = self
            .quotes
            .iter()
            .position(|quote| quote.id == id)
            .ok_or(QuoteError::NotFound(id))?;
        Ok(self.quotes.remove(position))
    }

    /// Full sequence in insertion order.
    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn get(&self, id: QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|quote| quote.id == id)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Quotes in `category`, or every quote for the `all` sentinel.
    pub fn by_category(&self, category: &str) -> Vec<&Quote> {
        if category == ALL_CATEGORIES {
            return self.quotes.iter().collect();
        }
        self.quotes
            .iter()
            .filter(|quote| quote.category == category)
            .collect()
    }

    /// Quotes passing the preference's category filter, in insertion order.
    pub fn filtered(&self, preference: &FilterPreference) -> Vec<&Quote> {
        self.quotes
            .iter()
            .filter(|quote| preference.matches(&quote.category))
            .collect()
    }

    /// Filtered view ordered per the preference's sort order.
    ///
    /// Sorting is stable; equal keys keep insertion order.
    pub fn sorted<R: Rng + ?Sized>(&self, preference: &FilterPreference, rng: &mut R) -> Vec<Quote> {
        let mut view: Vec<Quote> = self
            .filtered(preference)
            .into_iter()
            .cloned()
            .collect();
        match preference.sort_order {
            SortOrder::Random => view.shuffle(rng),
            SortOrder::Newest => view.sort_by(|a, b| compare_timestamps(b, a)),
            SortOrder::Oldest => view.sort_by(compare_timestamps),
            SortOrder::Author => view.sort_by(|a, b| {
                a.author_or_unknown()
                    .to_lowercase()
                    .cmp(&b.author_or_unknown().to_lowercase())
                    .then_with(|| a.text.cmp(&b.text))
            }),
        }
        view
    }

    /// Returns whether a quote with this text + author already exists.
    pub fn has_duplicate(&self, text: &str, author: Option<&str>) -> bool {
        self.quotes
            .iter()
            .any(|quote| quote.is_duplicate_of(text, author))
    }

    /// Appends imported records that are valid and not duplicates.
    ///
    /// Duplicates are detected against the store and within the batch.
    /// Records whose id is already taken receive a fresh id.
    pub fn append_imported(&mut self, records: Vec<QuoteRecord>) -> ImportReport {
        let mut report = ImportReport::default();
        let mut taken: HashSet<QuoteId> = self.quotes.iter().map(|quote| quote.id).collect();
        for record in records {
            let quote = match Quote::from_record(record, &mut self.ids, |id| taken.contains(&id)) {
                Ok(quote) => quote,
                Err(_) => {
                    report.invalid += 1;
                    continue;
                }
            };
            if self.has_duplicate(&quote.text, quote.author.as_deref()) {
                report.duplicates += 1;
                continue;
            }
            taken.insert(quote.id);
            report.imported.push(quote.id);
            self.quotes.push(quote);
        }
        report
    }

    /// Installs a new sequence verbatim (used by sync resolution and load).
    ///
    /// Later entries sharing an id with an earlier one are dropped.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) {
        let mut seen = HashSet::new();
        self.quotes = quotes
            .into_iter()
            .filter(|quote| seen.insert(quote.id))
            .collect();
        for quote in &self.quotes {
            self.ids.observe(quote.id);
        }
    }

    pub fn clear(&mut self) {
        self.quotes.clear();
    }

    /// Tags the given quotes as `synced`; returns how many were updated.
    pub fn mark_synced(&mut self, ids: &[QuoteId]) -> usize {
        let wanted: HashSet<QuoteId> = ids.iter().copied().collect();
        let mut updated = 0;
        for quote in &mut self.quotes {
            if wanted.contains(&quote.id) && quote.source != QuoteSource::Synced {
                quote.source = QuoteSource::Synced;
                updated += 1;
            }
        }
        updated
    }

    /// Mutable access to the id generator for callers building quotes.
    pub fn id_generator(&mut self) -> &mut QuoteIdGenerator {
        &mut self.ids
    }
}

fn compare_timestamps(a: &Quote, b: &Quote) -> Ordering {
    match (parse_timestamp(&a.timestamp), parse_timestamp(&b.timestamp)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => a.timestamp.cmp(&b.timestamp),
    }
}
