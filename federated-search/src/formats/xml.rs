//! Atom/OpenSearch feed responses → normalised records.
//!
//! Each entry is read through the configured field list, enriched with the
//! fields carried in its nested content body, escaped once, and finally
//! renamed to the shared record shape (`id` → `uri`, `modified` → `mtime`).

use serde_json::{Number, Value};

use super::atom::{parse_feed, AtomEntry, FeedValue};
use super::fragment::parse_fragment;
use crate::error::SearchError;
use crate::escape::{escape, escape_value};
use crate::types::{Record, SourceResults};

/// Field renames applied after extraction. The original keys are removed.
const RENAMES: &[(&str, &str)] = &[("modified", "mtime"), ("id", "uri")];

/// Parses a feed body into records and the feed's `totalResults`.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the body is not UTF-8 or not a
/// well-formed Atom feed.
pub fn parse_feed_response(body: &[u8], fields: &[String]) -> Result<SourceResults, SearchError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| SearchError::Parse(format!("feed is not valid UTF-8: {e}")))?;
    let feed = parse_feed(text)?;
    let records = feed
        .entries
        .iter()
        .map(|entry| normalize_entry(entry, fields))
        .collect();
    Ok(SourceResults {
        records,
        total: feed.total_results.unwrap_or(0),
    })
}

/// Builds one record from a feed entry.
pub fn normalize_entry(entry: &AtomEntry, fields: &[String]) -> Record {
    let mut record = Record::new();

    for name in fields {
        match entry.field(name) {
            Some(value) => {
                record.insert(name.as_str(), normalize_value(value));
            }
            None => tracing::trace!(field = %name, "entry has no such field"),
        }
    }

    if let Some(body) = entry.content.as_deref() {
        match parse_fragment(body) {
            Ok(extra) => {
                for (name, value) in extra {
                    record.insert(name, normalize_value(value));
                }
            }
            Err(err) => tracing::warn!(error = %err, "skipping unparseable entry content"),
        }
    }

    for (from, to) in RENAMES {
        record.rename(from, to);
    }

    coerce_score(&mut record);
    record
}

fn normalize_value(value: FeedValue) -> Value {
    match value {
        FeedValue::Text(text) | FeedValue::Content(text) => Value::String(escape(&text)),
        FeedValue::Timestamp(secs) => Value::Number(secs.into()),
        FeedValue::Structured(tree) => escape_value(tree),
    }
}

/// Makes sure `score` is numeric so the record can be ranked.
fn coerce_score(record: &mut Record) {
    let parsed = match record.get("score") {
        Some(Value::Number(_)) => return,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    };
    let score = match parsed {
        Some(score) => score,
        None => {
            let uri = record
                .get("uri")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            tracing::warn!(%uri, "feed entry has no numeric score, ranking it as 0");
            Number::from(0)
        }
    };
    record.insert("score", Value::Number(score));
}
