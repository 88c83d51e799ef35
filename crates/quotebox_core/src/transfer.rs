//! JSON import/export documents.
//!
//! # Responsibility
//! - Parse user-supplied import files into loose quote records.
//! - Build the export document and its download file name.
//!
//! # Invariants
//! - Import accepts a bare array or an object with a `quotes` array; any other
//!   shape is an import error and nothing is imported.
//! - Inside a valid array, entries that fail to deserialize are counted and
//!   skipped; the remaining records still import.
//! - Export output re-imports into an empty store without loss.

use crate::error::{QuoteError, QuoteResult};
use crate::model::quote::{now_timestamp, Quote, QuoteRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Document written by export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub quotes: Vec<Quote>,
    pub categories: Vec<String>,
    pub export_date: String,
    pub total_quotes: usize,
    pub total_categories: usize,
}

impl ExportDocument {
    pub fn new(quotes: &[Quote], categories: &[String]) -> Self {
        Self {
            quotes: quotes.to_vec(),
            categories: categories.to_vec(),
            export_date: now_timestamp(),
            total_quotes: quotes.len(),
            total_categories: categories.len(),
        }
    }

    /// Pretty-printed JSON bytes ready to be written to a file.
    pub fn to_json_bytes(&self) -> QuoteResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|err| QuoteError::Import(format!("export serialization failed: {err}")))
    }
}

/// Download name for an export taken at `at`: `quotes-export-YYYY-MM-DD.json`.
pub fn export_file_name(at: OffsetDateTime) -> String {
    format!(
        "quotes-export-{:04}-{:02}-{:02}.json",
        at.year(),
        u8::from(at.month()),
        at.day()
    )
}

/// Records parsed from one import file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub records: Vec<QuoteRecord>,
    /// Array entries that were not quote-shaped objects.
    pub malformed: usize,
}

/// Parses import text into loose records.
///
/// # Errors
/// - `QuoteError::Import` for invalid JSON or a payload without a quote array.
pub fn parse_import(input: &str) -> QuoteResult<ImportBatch> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| QuoteError::Import(format!("invalid JSON: {err}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("quotes") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(QuoteError::Import(
                    "expected an array of quotes or an object with a `quotes` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(QuoteError::Import(
                "expected an array of quotes".to_string(),
            ))
        }
    };

    let mut batch = ImportBatch::default();
    for item in items {
        match item
            .is_object()
            .then(|| serde_json::from_value::<QuoteRecord>(item))
        {
            Some(Ok(record)) => batch.records.push(record),
            _ => batch.malformed += 1,
        }
    }
    Ok(batch)
}
