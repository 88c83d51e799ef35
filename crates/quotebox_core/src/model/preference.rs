//! Filter/sort preference persisted independently of the quote snapshot.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Category sentinel meaning "no filtering".
pub const ALL_CATEGORIES: &str = "all";

/// Ordering applied to the filtered quote view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Random,
    Newest,
    Oldest,
    Author,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Author => "author",
        }
    }

    /// Parses a sort order label, case-insensitive.
    pub fn parse(value: &str) -> Result<Self, UnknownSortOrder> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "author" => Ok(Self::Author),
            other => Err(UnknownSortOrder(other.to_string())),
        }
    }
}

/// Returned by [`SortOrder::parse`] for unsupported labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortOrder(pub String);

impl Display for UnknownSortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported sort order `{}`; expected random|newest|oldest|author",
            self.0
        )
    }
}

impl Error for UnknownSortOrder {}

/// Last selected category filter and sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPreference {
    pub category: String,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for FilterPreference {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            sort_order: SortOrder::default(),
        }
    }
}

impl FilterPreference {
    pub fn new(category: impl Into<String>, sort_order: SortOrder) -> Self {
        let category = category.into();
        let category = if category.trim().is_empty() {
            ALL_CATEGORIES.to_string()
        } else {
            category.trim().to_string()
        };
        Self {
            category,
            sort_order,
        }
    }

    /// Returns whether this preference applies no category filter.
    pub fn is_unfiltered(&self) -> bool {
        self.category == ALL_CATEGORIES
    }

    /// Returns whether a quote in `category` passes this filter.
    pub fn matches(&self, category: &str) -> bool {
        self.is_unfiltered() || self.category == category
    }
}
