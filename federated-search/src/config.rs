//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] names the sources to query, the per-request timeout,
//! the Atom entry fields to extract and how unsupported response encodings
//! are treated.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SearchError;

/// Atom entry fields extracted when no field list is configured.
pub const DEFAULT_FIELDS: &[&str] = &[
    "title", "id", "author", "link", "summary", "tags", "modified",
];

/// How a response with an unrecognised content type is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentPolicy {
    /// Fail the whole search, returning no partial results.
    #[default]
    Strict,
    /// Log a warning and drop the offending source.
    Lenient,
}

/// Configuration for a federated search.
///
/// Use [`SearchConfig::new`] or [`Default::default()`] plus field overrides.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Source URLs, queried concurrently. Results are merged in this order
    /// before sorting, which fixes the tie-break between equal scores.
    pub urls: Vec<String>,
    /// Per-request timeout. `None` waits for each source indefinitely.
    pub timeout: Option<Duration>,
    /// Fields read off every Atom feed entry.
    pub fields: Vec<String>,
    /// Upper bound on in-flight requests. `None` uses the number of
    /// available processing units.
    pub max_concurrency: Option<usize>,
    /// Treatment of responses that are neither JSON nor an Atom feed.
    pub unsupported_content: ContentPolicy,
    /// Custom User-Agent header. If `None`, `federated-search/<version>`.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout: None,
            fields: DEFAULT_FIELDS.iter().map(|f| (*f).to_owned()).collect(),
            max_concurrency: None,
            unsupported_content: ContentPolicy::default(),
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Creates a configuration for the given sources with default settings.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the Atom entry field list.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the unsupported content type policy.
    pub fn with_content_policy(mut self, policy: ContentPolicy) -> Self {
        self.unsupported_content = policy;
        self
    }

    /// Caps the number of concurrent requests.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Number of requests allowed in flight at once.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `urls` must not be empty
    /// - every URL must be an absolute `http` or `https` URL
    /// - `timeout`, if set, must be greater than zero
    /// - `max_concurrency`, if set, must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.urls.is_empty() {
            return Err(SearchError::Config(
                "at least one source URL is required".into(),
            ));
        }
        for raw in &self.urls {
            let parsed = Url::parse(raw)
                .map_err(|e| SearchError::Config(format!("invalid source URL {raw:?}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SearchError::Config(format!(
                    "source URL {raw:?} must use http or https"
                )));
            }
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(SearchError::Config(
                "timeout must be greater than 0".into(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(SearchError::Config(
                "max_concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
