//! Core search orchestrator: fetch, parse, normalise, merge.
//!
//! Fetches every configured source concurrently, parses each response in
//! source order, applies the unsupported-content policy, and merges the
//! survivors into one ranked [`AggregateResult`].

use std::time::Duration;

use crate::config::{ContentPolicy, SearchConfig};
use crate::error::SearchError;
use crate::formats::parse_response;
use crate::transport::Transport;
use crate::types::{AggregateResult, SourceReport, SourceResults, SourceStatus};

use super::aggregate::aggregate;
use super::fetch::{fetch_all, FetchOutcome};

/// Orchestrate a federated search across all configured sources.
///
/// # Pipeline
///
/// 1. Validate `config` (an empty URL list fails before any request)
/// 2. Fetch every source concurrently, bounded by `config.concurrency()`
/// 3. Parse each response in URL order
/// 4. Absorb transport and body parse failures as per-source reports
/// 5. Apply `config.unsupported_content` to unrecognised content types
/// 6. Sum totals, concatenate records and stable-sort by score
///
/// # Errors
///
/// - [`SearchError::Config`] if the configuration is invalid
/// - [`SearchError::UnsupportedContentType`] under [`ContentPolicy::Strict`]
///   when any source answers with an unrecognised content type; no partial
///   results are returned
pub async fn orchestrate_search<T: Transport>(
    transport: &T,
    config: &SearchConfig,
) -> Result<AggregateResult, SearchError> {
    config.validate()?;

    let fetched = fetch_all(
        transport,
        &config.urls,
        config.timeout,
        config.concurrency(),
    )
    .await?;

    let mut parsed: Vec<Option<SourceResults>> = Vec::with_capacity(fetched.len());
    let mut sources: Vec<SourceReport> = Vec::with_capacity(fetched.len());

    for (index, outcome) in fetched.into_iter().enumerate() {
        let (status, contribution) = settle(index, &outcome, config)?;
        sources.push(SourceReport {
            url: outcome.url,
            status,
            elapsed_ms: millis(outcome.elapsed),
        });
        parsed.push(contribution);
    }

    let mut result = aggregate(parsed);
    result.sources = sources;

    tracing::debug!(
        total = result.total,
        count = result.results.len(),
        sources = result.sources.len(),
        failed = result.sources.iter().filter(|s| !s.status.is_ok()).count(),
        "federated search complete"
    );

    Ok(result)
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Turns one fetch outcome into a report and an optional contribution.
fn settle(
    index: usize,
    outcome: &FetchOutcome,
    config: &SearchConfig,
) -> Result<(SourceStatus, Option<SourceResults>), SearchError> {
    let raw = match &outcome.result {
        Ok(raw) => raw,
        Err(err) => {
            return Ok((
                SourceStatus::TransportFailed {
                    error: err.to_string(),
                },
                None,
            ))
        }
    };

    match parse_response(raw, &config.fields) {
        Ok(results) => {
            tracing::debug!(
                url = %outcome.url,
                records = results.records.len(),
                total = results.total,
                elapsed_ms = millis(outcome.elapsed),
                "source parsed"
            );
            let status = SourceStatus::Ok {
                records: results.records.len(),
                total: results.total,
            };
            Ok((status, Some(results)))
        }
        Err(SearchError::UnsupportedContentType { url, content_type }) => {
            match config.unsupported_content {
                ContentPolicy::Strict => {
                    Err(SearchError::UnsupportedContentType { url, content_type })
                }
                ContentPolicy::Lenient => {
                    tracing::warn!(
                        source = index,
                        content_type = %content_type,
                        "skipping source with unsupported content type"
                    );
                    tracing::debug!(source = index, url = %url, "skipped source");
                    Ok((SourceStatus::Skipped { content_type }, None))
                }
            }
        }
        Err(err) => {
            tracing::warn!(source = index, error = %err, "dropping source with unparseable body");
            tracing::debug!(source = index, url = %outcome.url, "dropped source");
            Ok((
                SourceStatus::ParseFailed {
                    error: err.to_string(),
                },
                None,
            ))
        }
    }
}
