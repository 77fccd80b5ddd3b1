//! Trait definition for the request side of the pipeline.
//!
//! The orchestrator only needs "GET this URL and hand me the content type
//! and body". [`Transport`] captures exactly that so the fetch phase can be
//! driven by [`crate::http::HttpTransport`] in production and by canned
//! responses in tests.

use crate::error::SearchError;
use crate::types::RawResponse;

/// Issues a single GET request for a source.
///
/// Implementations must not retry and must be `Send + Sync` so that many
/// requests can be in flight at once. Timeouts are applied by the caller.
pub trait Transport: Send + Sync {
    /// Fetches `url`, returning the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the request fails or the server
    /// answers with a non-success status.
    fn get(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<RawResponse, SearchError>> + Send;
}
