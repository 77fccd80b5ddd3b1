//! Core types flowing through the fetch → parse → merge pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A raw HTTP response from one source, consumed once by the parser.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The URL the response was fetched from.
    pub source_url: String,
    /// The declared `Content-Type` header, or an empty string if absent.
    pub content_type: String,
    /// The undecoded response body.
    pub body: Vec<u8>,
}

/// Response encodings understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// `{ "total": .., "results": [..] }` envelope.
    Json,
    /// Atom feed with the OpenSearch extension.
    Xml,
}

impl Encoding {
    /// Classifies a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored and the comparison is
    /// case-insensitive. Returns `None` for anything unrecognised.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(Self::Json),
            "application/xml" | "application/atom+xml" | "text/xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Xml => "xml",
        })
    }
}

/// One normalised search result: a map from field name to value.
///
/// Records from JSON sources are carried verbatim. Records built from Atom
/// entries always carry a numeric `score`, and `uri`/`mtime` in place of
/// `id`/`modified`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// The relevance score used for ranking.
    ///
    /// Numbers and numeric strings are accepted. Records without a usable
    /// score rank as `0.0`.
    pub fn score(&self) -> f64 {
        match self.0.get("score") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|s| !s.is_nan())
        .unwrap_or(0.0)
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a field, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Removes a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` if the record has the field.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Moves the value under `from` to `to`. Does nothing if `from` is absent.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.0.remove(from) {
            self.0.insert(to.to_owned(), value);
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Records and hit total parsed from a single source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceResults {
    /// Normalised records in the order the source returned them.
    pub records: Vec<Record>,
    /// The source's own total hit count.
    pub total: u64,
}

/// What happened to one source during a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source was fetched and parsed.
    Ok {
        /// Number of records contributed.
        records: usize,
        /// The source's total hit count.
        total: u64,
    },
    /// The request failed or timed out.
    TransportFailed {
        /// Failure description.
        error: String,
    },
    /// The body could not be parsed; the source contributed nothing.
    ParseFailed {
        /// Failure description.
        error: String,
    },
    /// The content type was unrecognised and the lenient policy dropped it.
    Skipped {
        /// The declared content type.
        content_type: String,
    },
}

impl SourceStatus {
    /// Returns `true` if the source contributed to the aggregate.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Per-source diagnostics attached to an [`AggregateResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// The source URL.
    pub url: String,
    /// Outcome for this source.
    #[serde(flatten)]
    pub status: SourceStatus,
    /// Time from request start to response (or failure), in milliseconds.
    pub elapsed_ms: u64,
}

/// The merged outcome of a federated search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Sum of every source's total hit count.
    pub total: u64,
    /// All records, sorted by score descending. Equal scores keep source
    /// order, then within-source order.
    pub results: Vec<Record>,
    /// One report per configured source, in configuration order.
    pub sources: Vec<SourceReport>,
}
