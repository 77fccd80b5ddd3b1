//! Error types for the federated-search crate.
//!
//! Only configuration errors and unsupported response encodings reach the
//! caller of a search. Transport and feed parse failures are absorbed per
//! source and reported through [`crate::types::SourceStatus`].

/// Errors that can occur while running a federated search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Invalid search configuration (for example an empty URL list).
    #[error("config error: {0}")]
    Config(String),

    /// A source answered with a content type that is neither the JSON
    /// envelope nor the Atom/OpenSearch feed.
    #[error("unsupported content type {content_type:?} from {url}")]
    UnsupportedContentType {
        /// The source URL that produced the response.
        url: String,
        /// The declared content type, as sent by the server.
        content_type: String,
    },

    /// An HTTP request to a source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A request to a source exceeded the configured timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience type alias for federated-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
