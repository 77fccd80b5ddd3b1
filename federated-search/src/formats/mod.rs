//! Response parsing: content-type dispatch to the JSON or Atom readers.
//!
//! Dispatch is strict. Anything other than the JSON envelope or an Atom
//! feed yields [`SearchError::UnsupportedContentType`]; the orchestrator
//! decides whether that aborts the search.

pub mod atom;
pub mod fragment;
pub mod json;
pub mod xml;

use crate::error::SearchError;
use crate::types::{Encoding, RawResponse, SourceResults};

/// Parses one raw response into records and the source's hit total.
///
/// `fields` is the list of Atom entry fields to extract; it does not apply
/// to JSON responses.
///
/// # Errors
///
/// - [`SearchError::UnsupportedContentType`] for an unrecognised content type
/// - [`SearchError::Parse`] for a body that cannot be decoded
pub fn parse_response(raw: &RawResponse, fields: &[String]) -> Result<SourceResults, SearchError> {
    let encoding = Encoding::from_content_type(&raw.content_type).ok_or_else(|| {
        SearchError::UnsupportedContentType {
            url: raw.source_url.clone(),
            content_type: raw.content_type.clone(),
        }
    })?;

    tracing::trace!(
        url = %raw.source_url,
        %encoding,
        bytes = raw.body.len(),
        "parsing response"
    );

    match encoding {
        Encoding::Json => json::parse_envelope(&raw.body),
        Encoding::Xml => xml::parse_feed_response(&raw.body, fields),
    }
}
