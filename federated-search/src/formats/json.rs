//! Native JSON result envelope: `{ "total": <int>, "results": [ {..} ] }`.
//!
//! Result objects are taken verbatim. Their text is never escaped since the
//! producing server already renders it safe for display.

use serde_json::Value;

use crate::error::SearchError;
use crate::types::{Record, SourceResults};

/// Parses a JSON envelope body.
///
/// A missing or non-integer `total` counts as 0. A missing `results` list
/// yields no records; non-object list elements are skipped.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the body is not a JSON object.
pub fn parse_envelope(body: &[u8]) -> Result<SourceResults, SearchError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| SearchError::Parse(format!("invalid JSON envelope: {e}")))?;
    let Value::Object(mut envelope) = value else {
        return Err(SearchError::Parse(
            "JSON envelope must be an object".into(),
        ));
    };

    let total = envelope.get("total").and_then(Value::as_u64).unwrap_or(0);

    let records = match envelope.remove("results") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(Record(map)),
                other => {
                    tracing::warn!(kind = %json_kind(&other), "skipping non-object result");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!(kind = %json_kind(&other), "ignoring non-list results field");
            Vec::new()
        }
        None => Vec::new(),
    };

    Ok(SourceResults { records, total })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
