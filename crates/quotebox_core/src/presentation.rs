//! Presentation helpers: rendering, random pick, notices, stats.
//!
//! Pure consumers of store data; nothing here mutates a session.

use crate::error::QuoteError;
use crate::model::quote::Quote;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::{Display, Formatter};

/// Result of a render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedQuote {
    Quote(Quote),
    /// The active filter matched nothing.
    Empty { category: String },
}

impl RenderedQuote {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Quote(quote) => Some(quote),
            Self::Empty { .. } => None,
        }
    }
}

impl Display for RenderedQuote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quote(quote) => write!(
                f,
                "\"{}\"\n- {}\n[{}]",
                quote.text,
                quote.author_or_unknown(),
                quote.category
            ),
            Self::Empty { category } => write!(
                f,
                "No quotes found in category \"{category}\". Try another category or add new quotes."
            ),
        }
    }
}

/// Picks one quote uniformly at random.
pub fn pick_random<'a, R: Rng + ?Sized>(quotes: &[&'a Quote], rng: &mut R) -> Option<&'a Quote> {
    quotes.choose(rng).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// User-visible status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    /// Converts an operation error into a notice.
    ///
    /// Storage and network failures are warnings: the session keeps running
    /// on in-memory state.
    pub fn from_error(err: &QuoteError) -> Self {
        let level = match err {
            QuoteError::Storage(_)
            | QuoteError::Network(_)
            | QuoteError::SyncBusy(_)
            | QuoteError::SyncCancelled => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self::new(level, err.to_string())
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}

/// Counters shown next to the quote display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteStats {
    pub total: usize,
    /// Quotes matching the active filter.
    pub filtered: usize,
    pub categories: usize,
}

#[cfg(test)]
mod tests {
    use super::{pick_random, Notice, NoticeLevel, RenderedQuote};
    use crate::error::{NetworkError, QuoteError};
    use crate::model::quote::{Quote, QuoteSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn renders_quote_and_empty_filter() {
        let quote = Quote::new(1, "Be here now.", None, "Wisdom", QuoteSource::Local);
        assert_eq!(
            RenderedQuote::Quote(quote).to_string(),
            "\"Be here now.\"\n- Unknown\n[Wisdom]"
        );

        let empty = RenderedQuote::Empty {
            category: "Love".to_string(),
        };
        assert!(empty.to_string().starts_with("No quotes found in category \"Love\""));
    }

    #[test]
    fn pick_random_stays_within_input() {
        let a = Quote::new(1, "a", None, "Life", QuoteSource::Local);
        let b = Quote::new(2, "b", None, "Life", QuoteSource::Local);
        let pool = vec![&a, &b];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let picked = pick_random(&pool, &mut rng).expect("non-empty pool");
            assert!(picked.id == 1 || picked.id == 2);
        }
        assert!(pick_random(&[], &mut rng).is_none());
    }

    #[test]
    fn network_errors_become_warnings() {
        let notice = Notice::from_error(&QuoteError::Network(NetworkError::Transport(
            "dns".to_string(),
        )));
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.to_string().starts_with("[warning]"));
    }
}
