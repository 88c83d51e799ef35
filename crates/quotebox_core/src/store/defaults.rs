//! Built-in quote set used when nothing usable was persisted.

use crate::model::quote::{Quote, QuoteIdGenerator, QuoteSource};

const DEFAULT_QUOTES: &[(&str, &str, &str)] = &[
    (
        "The only way to do great work is to love what you do.",
        "Steve Jobs",
        "Motivation",
    ),
    (
        "Life is what happens to you while you're busy making other plans.",
        "John Lennon",
        "Life",
    ),
    (
        "The future belongs to those who believe in the beauty of their dreams.",
        "Eleanor Roosevelt",
        "Inspiration",
    ),
    (
        "It is during our darkest moments that we must focus to see the light.",
        "Aristotle",
        "Perseverance",
    ),
    (
        "Whoever is happy will make others happy too.",
        "Anne Frank",
        "Happiness",
    ),
    (
        "You must be the change you wish to see in the world.",
        "Mahatma Gandhi",
        "Wisdom",
    ),
    (
        "Spread love everywhere you go. Let no one ever come to you without leaving happier.",
        "Mother Teresa",
        "Love",
    ),
    (
        "The only thing we have to fear is fear itself.",
        "Franklin D. Roosevelt",
        "Courage",
    ),
];

/// Builds the default quote set with fresh ids and `source = default`.
pub fn default_quotes(ids: &mut QuoteIdGenerator) -> Vec<Quote> {
    DEFAULT_QUOTES
        .iter()
        .map(|(text, author, category)| {
            Quote::new(
                ids.next(),
                *text,
                Some((*author).to_string()),
                *category,
                QuoteSource::Default,
            )
        })
        .collect()
}
