//! Derived, sorted set of category labels.

use crate::model::quote::Quote;
use std::collections::BTreeSet;

/// Labels substituted when no quote carries a category.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Motivation",
    "Life",
    "Inspiration",
    "Perseverance",
    "Wisdom",
    "Love",
    "Courage",
];

/// Sorted unique categories of the current quote set.
///
/// Always rebuilt from quotes; a persisted category list is never trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl Default for CategoryIndex {
    fn default() -> Self {
        Self::from_quotes(&[])
    }
}

impl CategoryIndex {
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let mut index = Self {
            categories: Vec::new(),
        };
        index.recompute(quotes);
        index
    }

    /// Rescans `quotes` and replaces the index contents.
    ///
    /// Empty results fall back to [`DEFAULT_CATEGORIES`] (sorted).
    pub fn recompute(&mut self, quotes: &[Quote]) {
        let mut unique: BTreeSet<&str> = quotes
            .iter()
            .map(|quote| quote.category.as_str())
            .filter(|category| !category.trim().is_empty())
            .collect();
        if unique.is_empty() {
            unique = DEFAULT_CATEGORIES.iter().copied().collect();
        }
        self.categories = unique.into_iter().map(str::to_string).collect();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoryIndex, DEFAULT_CATEGORIES};
    use crate::model::quote::{Quote, QuoteSource};

    fn quote(id: i64, category: &str) -> Quote {
        Quote::new(id, "text", None, category, QuoteSource::Local)
    }

    #[test]
    fn recompute_sorts_and_deduplicates() {
        let index = CategoryIndex::from_quotes(&[
            quote(1, "Wisdom"),
            quote(2, "Life"),
            quote(3, "Wisdom"),
        ]);
        assert_eq!(index.as_slice(), ["Life".to_string(), "Wisdom".to_string()]);
    }

    #[test]
    fn empty_store_falls_back_to_defaults() {
        let index = CategoryIndex::from_quotes(&[]);
        assert_eq!(index.len(), DEFAULT_CATEGORIES.len());
        assert!(index.as_slice().iter().any(|category| category == "Courage"));
        let mut sorted = index.as_slice().to_vec();
        sorted.sort();
        assert_eq!(sorted, index.as_slice());
    }

    #[test]
    fn blank_categories_are_ignored() {
        let index = CategoryIndex::from_quotes(&[quote(1, "  "), quote(2, "Life")]);
        assert_eq!(index.as_slice(), ["Life".to_string()]);
    }
}
