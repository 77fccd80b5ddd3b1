//! Concurrent, order-preserving fetch phase.
//!
//! One request per source URL, at most `concurrency` in flight. Each request
//! carries its own timeout, and its outcome lands in the slot matching the
//! URL's position regardless of completion order.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::error::SearchError;
use crate::transport::Transport;
use crate::types::RawResponse;

/// The result of fetching one source.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The source URL.
    pub url: String,
    /// The raw response, or the transport failure for this source only.
    pub result: Result<RawResponse, SearchError>,
    /// Time spent on this request.
    pub elapsed: Duration,
}

/// Fetches every URL and returns outcomes in URL order.
///
/// A failure or timeout on one URL never cancels the others. There are no
/// retries.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an empty URL list, before any request
/// is issued.
pub async fn fetch_all<T: Transport>(
    transport: &T,
    urls: &[String],
    timeout: Option<Duration>,
    concurrency: usize,
) -> Result<Vec<FetchOutcome>, SearchError> {
    if urls.is_empty() {
        return Err(SearchError::Config(
            "at least one source URL is required".into(),
        ));
    }

    // Outcomes arrive in completion order and go back into their URL's slot.
    let mut slots: Vec<Option<FetchOutcome>> = urls.iter().map(|_| None).collect();
    let mut pending = stream::iter(urls.iter().enumerate().map(|(index, url)| async move {
        (index, fetch_one(transport, index, url, timeout).await)
    }))
    .buffer_unordered(concurrency.max(1));

    while let Some((index, outcome)) = pending.next().await {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

async fn fetch_one<T: Transport>(
    transport: &T,
    index: usize,
    url: &str,
    timeout: Option<Duration>,
) -> FetchOutcome {
    let start = Instant::now();
    let request = transport.get(url);

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, request).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(format!(
                "no response within {}ms",
                limit.as_millis()
            ))),
        },
        None => request.await,
    };

    if let Err(ref err) = result {
        tracing::warn!(source = index, error = %err, "source request failed");
        tracing::debug!(source = index, url, "failed source");
    }

    FetchOutcome {
        url: url.to_owned(),
        result,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every URL after the delay encoded in its path (`/delay/<ms>`),
    /// failing URLs that contain `fail`.
    #[derive(Default)]
    struct DelayTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Transport for DelayTransport {
        async fn get(&self, url: &str) -> Result<RawResponse, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let ms = url
                .rsplit('/')
                .next()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("fail") {
                return Err(SearchError::Http(format!("{url} refused")));
            }
            Ok(RawResponse {
                source_url: url.to_owned(),
                content_type: "application/json".into(),
                body: Vec::new(),
            })
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| (*u).to_owned()).collect()
    }

    #[tokio::test]
    async fn empty_url_list_rejected_without_requests() {
        let transport = DelayTransport::default();
        let err = fetch_all(&transport, &[], None, 4).await.unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outcomes_keep_url_order() {
        let transport = DelayTransport::default();
        let list = urls(&[
            "https://a.example/delay/60",
            "https://b.example/delay/0",
            "https://c.example/delay/30",
        ]);
        let outcomes = fetch_all(&transport, &list, None, 3).await.expect("fetch");
        let order: Vec<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(order, list.iter().map(String::as_str).collect::<Vec<_>>());
        for outcome in &outcomes {
            let raw = outcome.result.as_ref().expect("ok");
            assert_eq!(raw.source_url, outcome.url);
        }
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_slot() {
        let transport = DelayTransport::default();
        let list = urls(&[
            "https://a.example/delay/0",
            "https://fail.example/delay/0",
            "https://c.example/delay/0",
        ]);
        let outcomes = fetch_all(&transport, &list, None, 3).await.expect("fetch");
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(SearchError::Http(_))));
        assert!(outcomes[2].result.is_ok());
    }

    #[tokio::test]
    async fn timeout_cancels_only_the_slow_request() {
        let transport = DelayTransport::default();
        let list = urls(&["https://slow.example/delay/5000", "https://b.example/delay/0"]);
        let started = Instant::now();
        let outcomes = fetch_all(&transport, &list, Some(Duration::from_millis(50)), 2)
            .await
            .expect("fetch");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(matches!(outcomes[0].result, Err(SearchError::Timeout(_))));
        assert!(outcomes[1].result.is_ok());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let transport = DelayTransport::default();
        let list: Vec<String> = (0..6)
            .map(|i| format!("https://s{i}.example/delay/20"))
            .collect();
        let outcomes = fetch_all(&transport, &list, None, 2).await.expect("fetch");
        assert_eq!(outcomes.len(), 6);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 6);
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn slow_source_does_not_hold_back_later_requests() {
        let transport = DelayTransport::default();
        let list = urls(&[
            "https://a.example/delay/800",
            "https://b.example/delay/200",
            "https://c.example/delay/200",
            "https://d.example/delay/200",
        ]);
        let started = Instant::now();
        let outcomes = fetch_all(&transport, &list, None, 2).await.expect("fetch");
        let elapsed = started.elapsed();

        // One worker serves the 800ms source while the other drains the rest.
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed < Duration::from_millis(950), "took {elapsed:?}");
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
        let order: Vec<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(order, list.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn timeout_error_omits_url() {
        let transport = DelayTransport::default();
        let list = urls(&["https://slow.example/delay/5000"]);
        let outcomes = fetch_all(&transport, &list, Some(Duration::from_millis(20)), 1)
            .await
            .expect("fetch");
        let err = outcomes[0].result.as_ref().unwrap_err();
        assert!(err.to_string().starts_with("timed out"));
        assert!(!err.to_string().contains("slow.example"));
    }

    #[tokio::test]
    async fn requests_overlap_when_allowed() {
        let transport = DelayTransport::default();
        let list: Vec<String> = (0..4)
            .map(|i| format!("https://s{i}.example/delay/40"))
            .collect();
        fetch_all(&transport, &list, None, 4).await.expect("fetch");
        assert!(transport.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn zero_concurrency_still_makes_progress() {
        let transport = DelayTransport::default();
        let list = urls(&["https://a.example/delay/0"]);
        let outcomes = fetch_all(&transport, &list, None, 0).await.expect("fetch");
        assert_eq!(outcomes.len(), 1);
    }
}
