//! Shared HTTP client for source requests.
//!
//! Provides a configured [`reqwest::Client`] and the [`HttpTransport`] used
//! by [`crate::FederatedSearch`] outside of tests.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::transport::Transport;
use crate::types::RawResponse;

/// User-Agent sent when the configuration does not name one.
pub const DEFAULT_USER_AGENT: &str = concat!("federated-search/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for source requests.
///
/// The client has:
/// - the configured User-Agent (or [`DEFAULT_USER_AGENT`])
/// - gzip and brotli decompression
/// - a bounded redirect policy
///
/// Per-request timeouts are applied by the fetch phase, not the client.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport from the search configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the client cannot be constructed.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, SearchError> {
        tracing::trace!(url, "source request");

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "application/json, application/atom+xml, application/xml;q=0.9",
            )
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("request failed: {}", e.without_url())))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("error status: {}", e.without_url())))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Http(format!("reading body failed: {}", e.without_url())))?;

        tracing::trace!(url, bytes = body.len(), %content_type, "source response received");

        Ok(RawResponse {
            source_url: url.to_owned(),
            content_type,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_names_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("federated-search/"));
    }

    #[test]
    fn build_client_with_default_config() {
        let config = SearchConfig::new(["https://a.example"]);
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = SearchConfig {
            user_agent: Some("CustomBot/1.0".into()),
            ..SearchConfig::new(["https://a.example"])
        };
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn http_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
    }
}
