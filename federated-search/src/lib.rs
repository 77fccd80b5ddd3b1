//! # federated-search
//!
//! Federated search across OpenSearch-style endpoints.
//!
//! One logical query is represented by a list of source URLs. Every source is
//! fetched concurrently, its response parsed according to its declared
//! content type, and the records merged into a single relevance-ordered
//! result set with a combined hit total.
//!
//! ## Design
//!
//! - Two response encodings: a native JSON envelope
//!   (`{"total": .., "results": [..]}`) and an Atom feed carrying the
//!   OpenSearch `totalResults` extension
//! - Atom entries are read through a configurable field list, enriched with
//!   the XML fields nested in their content body, escaped once, and renamed
//!   so every record carries `uri`, `mtime` and a numeric `score`
//! - Requests run concurrently with a per-request timeout; results are
//!   reassembled in configuration order, so ties in the final stable sort
//!   are reproducible
//! - Graceful degradation: transport failures and malformed bodies drop the
//!   affected source only. An unsupported content type fails the whole
//!   search unless [`ContentPolicy::Lenient`] is configured
//!
//! There is no caching, retrying, pagination or cross-source deduplication.

pub mod config;
pub mod error;
pub mod escape;
pub mod formats;
pub mod http;
pub mod orchestrator;
pub mod transport;
pub mod types;

pub use config::{ContentPolicy, SearchConfig, DEFAULT_FIELDS};
pub use error::{Result, SearchError};
pub use http::HttpTransport;
pub use transport::Transport;
pub use types::{AggregateResult, Record, SourceReport, SourceStatus};

/// Runs one federated search over HTTP.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid (no request is
/// made), or [`SearchError::UnsupportedContentType`] if a source answers
/// with an unrecognised content type under the strict policy. Individual
/// transport or parse failures are logged and reported per source but do
/// not fail the search.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> federated_search::Result<()> {
/// let config = federated_search::SearchConfig::new([
///     "https://a.example/search?q=rust&format=json",
///     "https://b.example/opensearch?q=rust",
/// ]);
/// let merged = federated_search::search(&config).await?;
/// println!("{} hits", merged.total);
/// for record in &merged.results {
///     println!("{:.2} {:?}", record.score(), record.get("title"));
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(config: &SearchConfig) -> Result<AggregateResult> {
    config.validate()?;
    let transport = HttpTransport::new(config)?;
    orchestrator::search::orchestrate_search(&transport, config).await
}

/// A configured federated search that remembers the last hit total.
///
/// Construction validates the configuration. [`FederatedSearch::search`]
/// can be called any number of times; each call re-fetches every source and
/// a failed call leaves the previous total untouched.
#[derive(Debug)]
pub struct FederatedSearch<T = HttpTransport> {
    config: SearchConfig,
    transport: T,
    total: u64,
}

impl FederatedSearch<HttpTransport> {
    /// Creates a search that fetches sources over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid configuration, or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport,
            total: 0,
        })
    }
}

impl<T: Transport> FederatedSearch<T> {
    /// Creates a search over a custom [`Transport`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid configuration.
    pub fn with_transport(config: SearchConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            total: 0,
        })
    }

    /// Fetches every source and returns the merged result.
    ///
    /// On success the combined total is stored for [`FederatedSearch::total`].
    ///
    /// # Errors
    ///
    /// Same as [`search`].
    pub async fn search(&mut self) -> Result<AggregateResult> {
        let result = orchestrator::search::orchestrate_search(&self.transport, &self.config).await?;
        self.total = result.total;
        Ok(result)
    }

    /// The total from the last successful search, or 0 before the first.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The Atom entry fields this search extracts.
    pub fn fields(&self) -> &[String] {
        &self.config.fields
    }

    /// The configured source URLs.
    pub fn urls(&self) -> &[String] {
        &self.config.urls
    }

    /// The full configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}
