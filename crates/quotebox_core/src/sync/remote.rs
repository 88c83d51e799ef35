//! Remote quote sources and the best-effort sync adapter.
//!
//! # Responsibility
//! - Define the source contract used by sync (`fetch`/`push`).
//! - Map mock-endpoint posts (`{id, title, userId}`) into server quotes.
//! - Swallow and log failures at the adapter boundary.
//!
//! # Invariants
//! - Fetched quotes always carry `source = server` and a non-empty category.
//! - Only `source = local` quotes are ever pushed.

use crate::config::SyncConfig;
use crate::error::NetworkError;
use crate::model::quote::{Quote, QuoteId, QuoteSource};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Categories assigned to remote posts, which carry none of their own.
pub const REMOTE_CATEGORY_PALETTE: &[&str] =
    &["Motivation", "Life", "Inspiration", "Wisdom", "Success"];

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const PUSH_USER_ID: i64 = 1;

/// Contract for anything that can serve and accept quotes remotely.
pub trait RemoteQuoteSource: Send + Sync {
    /// Short stable id used in logs.
    fn source_id(&self) -> &str;
    /// Reads the current remote quote list.
    fn fetch(&self) -> Result<Vec<Quote>, NetworkError>;
    /// Sends quotes outward; returns the ids the remote accepted.
    fn push(&self, quotes: &[Quote]) -> Result<Vec<QuoteId>, NetworkError>;
}

/// Post shape served by the mock endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload<'a> {
    title: &'a str,
    body: &'a str,
    user_id: i64,
    category: &'a str,
    quote_id: QuoteId,
}

/// Maps one remote post into a server quote.
///
/// Returns `None` for posts with a blank title. The category is picked from
/// [`REMOTE_CATEGORY_PALETTE`] by user id so repeated fetches stay stable.
pub fn map_remote_post(post: RemotePost) -> Option<Quote> {
    let text = post.title.trim();
    if text.is_empty() {
        return None;
    }
    let user_id = post.user_id.unwrap_or(PUSH_USER_ID);
    let palette_index = usize::try_from(user_id.rem_euclid(REMOTE_CATEGORY_PALETTE.len() as i64))
        .unwrap_or_default();
    let quote = Quote::new(
        post.id,
        text,
        Some(format!("User {user_id}")),
        REMOTE_CATEGORY_PALETTE[palette_index],
        QuoteSource::Server,
    );
    quote.validate().ok().map(|()| quote)
}

/// Blocking HTTP source for a JSON posts endpoint.
pub struct HttpRemoteSource {
    agent: ureq::Agent,
    endpoint: String,
    fetch_limit: u32,
}

impl HttpRemoteSource {
    pub fn new(config: &SyncConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build();
        Self {
            agent,
            endpoint: config.endpoint.clone(),
            fetch_limit: config.fetch_limit,
        }
    }
}

impl RemoteQuoteSource for HttpRemoteSource {
    fn source_id(&self) -> &str {
        "http"
    }

    fn fetch(&self) -> Result<Vec<Quote>, NetworkError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query("_limit", &self.fetch_limit.to_string())
            .call()
            .map_err(|err| map_ureq_error(err, &self.endpoint))?;
        let posts: Vec<RemotePost> = response
            .into_json()
            .map_err(|err| NetworkError::Decode(err.to_string()))?;
        Ok(posts.into_iter().filter_map(map_remote_post).collect())
    }

    /// One POST per quote; a partial failure still reports the accepted ids.
    fn push(&self, quotes: &[Quote]) -> Result<Vec<QuoteId>, NetworkError> {
        let mut accepted = Vec::with_capacity(quotes.len());
        let mut last_error = None;
        for quote in quotes {
            let payload = PushPayload {
                title: quote.text.as_str(),
                body: quote.author_or_unknown(),
                user_id: PUSH_USER_ID,
                category: quote.category.as_str(),
                quote_id: quote.id,
            };
            match self.agent.post(&self.endpoint).send_json(&payload) {
                Ok(_) => accepted.push(quote.id),
                Err(err) => last_error = Some(map_ureq_error(err, &self.endpoint)),
            }
        }
        match last_error {
            Some(err) if accepted.is_empty() => Err(err),
            _ => Ok(accepted),
        }
    }
}

fn map_ureq_error(err: ureq::Error, url: &str) -> NetworkError {
    match err {
        ureq::Error::Status(code, _) => NetworkError::Status {
            code,
            url: url.to_string(),
        },
        ureq::Error::Transport(transport) => NetworkError::Transport(transport.to_string()),
    }
}

/// Best-effort wrapper around a source; failures are logged, never raised.
#[derive(Clone)]
pub struct RemoteSyncAdapter {
    source: Arc<dyn RemoteQuoteSource>,
}

impl RemoteSyncAdapter {
    pub fn new(source: Arc<dyn RemoteQuoteSource>) -> Self {
        Self { source }
    }

    /// Fetch that reports failures to the caller (used by the sync engine).
    pub fn try_fetch(&self) -> Result<Vec<Quote>, NetworkError> {
        let started_at = Instant::now();
        match self.source.fetch() {
            Ok(quotes) => {
                info!(
                    "event=remote_fetch module=sync status=ok source={} records={} duration_ms={}",
                    self.source.source_id(),
                    quotes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(quotes)
            }
            Err(err) => {
                warn!(
                    "event=remote_fetch module=sync status=error source={} duration_ms={} error={}",
                    self.source.source_id(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Fetches remote quotes; any failure yields an empty list.
    pub fn fetch_remote(&self) -> Vec<Quote> {
        self.try_fetch().unwrap_or_default()
    }

    /// Pushes the `local` quotes among `quotes`; returns the accepted ids.
    ///
    /// Failures are logged and reported as an empty list.
    pub fn push_local(&self, quotes: &[Quote]) -> Vec<QuoteId> {
        let local: Vec<Quote> = quotes
            .iter()
            .filter(|quote| quote.source == QuoteSource::Local)
            .cloned()
            .collect();
        if local.is_empty() {
            return Vec::new();
        }

        match self.source.push(&local) {
            Ok(accepted) => {
                info!(
                    "event=remote_push module=sync status=ok source={} sent={} accepted={}",
                    self.source.source_id(),
                    local.len(),
                    accepted.len()
                );
                accepted
            }
            Err(err) => {
                warn!(
                    "event=remote_push module=sync status=error source={} sent={} error={}",
                    self.source.source_id(),
                    local.len(),
                    err
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{map_remote_post, RemotePost, REMOTE_CATEGORY_PALETTE};
    use crate::model::quote::QuoteSource;

    #[test]
    fn maps_post_into_server_quote() {
        let post: RemotePost = serde_json::from_str(
            r#"{"userId": 2, "id": 11, "title": " sunt aut facere ", "body": "quia et suscipit"}"#,
        )
        .expect("valid post json");

        let quote = map_remote_post(post).expect("post has a title");
        assert_eq!(quote.id, 11);
        assert_eq!(quote.text, "sunt aut facere");
        assert_eq!(quote.author.as_deref(), Some("User 2"));
        assert_eq!(quote.category, REMOTE_CATEGORY_PALETTE[2]);
        assert_eq!(quote.source, QuoteSource::Server);
    }

    #[test]
    fn category_is_stable_across_fetches() {
        let post = RemotePost {
            id: 1,
            title: "t".to_string(),
            body: None,
            user_id: Some(7),
        };
        let first = map_remote_post(post.clone()).expect("valid post");
        let second = map_remote_post(post).expect("valid post");
        assert_eq!(first.category, second.category);
    }

    #[test]
    fn blank_title_is_skipped() {
        let post = RemotePost {
            id: 1,
            title: "   ".to_string(),
            body: None,
            user_id: None,
        };
        assert!(map_remote_post(post).is_none());
    }
}
