//! Atom feed reader with the OpenSearch `totalResults` extension.
//!
//! The reader is deliberately small: it keeps the feed-level hit total and,
//! per entry, the simple child elements, authors, links, categories and the
//! decoded content body. Field lookups return an explicit [`FeedValue`] so
//! the normaliser never has to guess what kind of value it is holding.

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{json, Value};

use crate::error::SearchError;

/// OpenSearch 1.1 namespace carried by the feed root.
pub const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// A value read off a feed entry, tagged with how it must be normalised.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedValue {
    /// Plain text, entities already decoded.
    Text(String),
    /// A date, as seconds since the Unix epoch.
    Timestamp(i64),
    /// The text body of an entry's `<content>` element.
    Content(String),
    /// A nested value such as a tag list or a structured XML element.
    Structured(Value),
}

/// An Atom `<author>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// An Atom `<link>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    pub href: String,
    pub rel: Option<String>,
}

/// An Atom `<category>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    pub term: String,
    pub scheme: Option<String>,
    pub label: Option<String>,
}

/// One `<entry>` of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    /// Simple child elements by local name, in document order.
    pub elements: Vec<(String, String)>,
    pub authors: Vec<Person>,
    pub links: Vec<Link>,
    pub categories: Vec<Category>,
    /// Decoded `<content>` body.
    pub content: Option<String>,
}

impl AtomEntry {
    /// Text of the first simple child element with this local name.
    pub fn element(&self, name: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `alternate` link, falling back to the first link.
    pub fn link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| self.links.first())
            .map(|l| l.href.as_str())
    }

    /// Looks up a configured field name.
    ///
    /// Returns `None` when the entry does not carry the field.
    pub fn field(&self, name: &str) -> Option<FeedValue> {
        match name {
            "author" => self
                .authors
                .first()
                .and_then(|p| p.name.clone().or_else(|| p.email.clone()))
                .map(FeedValue::Text),
            "link" => self.link().map(|href| FeedValue::Text(href.to_owned())),
            "tags" if !self.categories.is_empty() => {
                let tags = self
                    .categories
                    .iter()
                    .map(|c| json!({"term": c.term, "scheme": c.scheme, "label": c.label}))
                    .collect();
                Some(FeedValue::Structured(Value::Array(tags)))
            }
            "tags" => None,
            "content" => self.content.clone().map(FeedValue::Content),
            "modified" | "updated" => self
                .element("updated")
                .or_else(|| self.element("modified"))
                .map(timestamp_value),
            "published" | "issued" | "created" => self
                .element("published")
                .or_else(|| self.element("issued"))
                .or_else(|| self.element("created"))
                .map(timestamp_value),
            other => self
                .element(other)
                .map(|text| FeedValue::Text(text.to_owned())),
        }
    }
}

/// A parsed feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomFeed {
    /// The feed-level `totalResults`, if present and numeric.
    pub total_results: Option<u64>,
    pub entries: Vec<AtomEntry>,
}

/// Parses an Atom feed document.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] for malformed XML, a truncated document or
/// a root element other than `<feed>`.
pub fn parse_feed(xml: &str) -> Result<AtomFeed, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut feed: Option<AtomFeed> = None;
    let mut entry: Option<AtomEntry> = None;
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(e) => {
                depth += 1;
                let name = local_name(&e);
                match (depth, name.as_str()) {
                    (1, "feed") => {
                        if !declares_opensearch(&e) {
                            tracing::debug!("feed root does not declare the OpenSearch namespace");
                        }
                        feed = Some(AtomFeed::default());
                    }
                    (1, other) => {
                        return Err(SearchError::Parse(format!(
                            "expected <feed> root element, found <{other}>"
                        )))
                    }
                    (2, "totalResults") => {
                        let text = read_text(&mut reader, &e)?;
                        depth -= 1;
                        if let Some(feed) = feed.as_mut() {
                            feed.total_results = parse_total(&text);
                        }
                    }
                    (2, "entry") => entry = Some(AtomEntry::default()),
                    (3, _) => {
                        if let Some(current) = entry.as_mut() {
                            read_entry_child(&mut reader, &e, &name, current)?;
                            depth -= 1;
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) if depth == 1 && local_name(&e) == "entry" => {
                if let Some(feed) = feed.as_mut() {
                    feed.entries.push(AtomEntry::default());
                }
            }
            Event::Empty(e) if depth == 2 => {
                if let Some(current) = entry.as_mut() {
                    empty_entry_child(&e, current)?;
                }
            }
            Event::End(e) => {
                if depth == 2 && e.local_name().as_ref() == b"entry" {
                    if let (Some(feed), Some(done)) = (feed.as_mut(), entry.take()) {
                        feed.entries.push(done);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SearchError::Parse(
            "unexpected end of document inside an open element".into(),
        ));
    }
    feed.ok_or_else(|| SearchError::Parse("document has no <feed> root element".into()))
}

fn declares_opensearch(root: &BytesStart<'_>) -> bool {
    root.attributes()
        .flatten()
        .any(|attr| attr.value.as_ref() == OPENSEARCH_NS.as_bytes())
}

fn read_entry_child(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    name: &str,
    entry: &mut AtomEntry,
) -> Result<(), SearchError> {
    match name {
        "author" => entry.authors.push(read_person(reader)?),
        "link" => {
            if let Some(link) = link_from(start)? {
                entry.links.push(link);
            }
            reader
                .read_to_end(start.name())
                .map_err(|e| malformed(reader, e))?;
        }
        "category" => {
            if let Some(category) = category_from(start)? {
                entry.categories.push(category);
            }
            reader
                .read_to_end(start.name())
                .map_err(|e| malformed(reader, e))?;
        }
        "content" => entry.content = Some(read_text(reader, start)?),
        _ => {
            let text = read_text(reader, start)?;
            entry.elements.push((name.to_owned(), text));
        }
    }
    Ok(())
}

fn empty_entry_child(start: &BytesStart<'_>, entry: &mut AtomEntry) -> Result<(), SearchError> {
    match local_name(start).as_str() {
        "link" => {
            if let Some(link) = link_from(start)? {
                entry.links.push(link);
            }
        }
        "category" => {
            if let Some(category) = category_from(start)? {
                entry.categories.push(category);
            }
        }
        "content" => entry.content = Some(String::new()),
        "author" => {}
        other => entry.elements.push((other.to_owned(), String::new())),
    }
    Ok(())
}

/// Reads an `<author>` body. Loose feeds put the name directly in the
/// element; that text is used when there is no `<name>` child.
fn read_person(reader: &mut Reader<&[u8]>) -> Result<Person, SearchError> {
    let mut person = Person::default();
    let mut bare = String::new();
    loop {
        match reader.read_event().map_err(|e| malformed(reader, e))? {
            Event::Start(e) => {
                let text = read_text(reader, &e)?;
                match e.local_name().as_ref() {
                    b"name" => person.name = Some(text),
                    b"email" => person.email = Some(text),
                    _ => {}
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| malformed(reader, e))?;
                bare.push_str(&text);
            }
            Event::CData(c) => bare.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => {
                if person.name.is_none() && !bare.trim().is_empty() {
                    person.name = Some(bare.trim().to_owned());
                }
                return Ok(person);
            }
            Event::Eof => {
                return Err(SearchError::Parse(
                    "unexpected end of document inside <author>".into(),
                ))
            }
            _ => {}
        }
    }
}

fn link_from(start: &BytesStart<'_>) -> Result<Option<Link>, SearchError> {
    let Some(href) = attribute(start, "href")? else {
        return Ok(None);
    };
    Ok(Some(Link {
        href,
        rel: attribute(start, "rel")?,
    }))
}

fn category_from(start: &BytesStart<'_>) -> Result<Option<Category>, SearchError> {
    let Some(term) = attribute(start, "term")? else {
        return Ok(None);
    };
    Ok(Some(Category {
        term,
        scheme: attribute(start, "scheme")?,
        label: attribute(start, "label")?,
    }))
}

/// Reads an element's body through its end tag.
///
/// Markup bodies (`type="xhtml"`, `type="xml"` or any `*/xml`/`*+xml` media
/// type) are returned as raw inner markup. Everything else is text: CDATA is
/// unwrapped and entities are decoded.
fn read_text(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<String, SearchError> {
    let kind = attribute(start, "type")?;
    let raw = reader
        .read_text(start.name())
        .map_err(|e| malformed(reader, e))?;
    if kind.as_deref().is_some_and(is_markup_type) {
        return Ok(raw.trim().to_owned());
    }
    decode_text(raw.trim())
}

fn is_markup_type(kind: &str) -> bool {
    let kind = kind.trim().to_ascii_lowercase();
    kind == "xhtml" || kind == "xml" || kind.ends_with("/xml") || kind.ends_with("+xml")
}

/// Decodes raw character data: CDATA sections verbatim, entities elsewhere.
fn decode_text(raw: &str) -> Result<String, SearchError> {
    const OPEN: &str = "<![CDATA[";
    const CLOSE: &str = "]]>";

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find(OPEN) {
        out.push_str(&unescape(&rest[..open])?);
        let after = &rest[open + OPEN.len()..];
        let close = after
            .find(CLOSE)
            .ok_or_else(|| SearchError::Parse("unterminated CDATA section".into()))?;
        out.push_str(&after[..close]);
        rest = &after[close + CLOSE.len()..];
    }
    out.push_str(&unescape(rest)?);
    Ok(out)
}

fn unescape(text: &str) -> Result<String, SearchError> {
    quick_xml::escape::unescape(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SearchError::Parse(format!("bad character reference: {e}")))
}

/// All attributes except namespace declarations, keyed by local name.
pub(crate) fn attribute_pairs(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, SearchError> {
    let mut pairs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SearchError::Parse(format!("bad attribute: {e}")))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| SearchError::Parse(format!("bad attribute value: {e}")))?;
        pairs.push((
            String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(pairs)
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, SearchError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SearchError::Parse(format!("bad attribute: {e}")))?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| SearchError::Parse(format!("bad attribute value: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

pub(crate) fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn malformed(reader: &Reader<&[u8]>, err: quick_xml::Error) -> SearchError {
    SearchError::Parse(format!(
        "malformed XML at byte {}: {err}",
        reader.buffer_position()
    ))
}

fn parse_total(text: &str) -> Option<u64> {
    match text.trim().parse::<u64>() {
        Ok(total) => Some(total),
        Err(_) => {
            tracing::warn!(value = text, "ignoring non-numeric totalResults");
            None
        }
    }
}

fn timestamp_value(text: &str) -> FeedValue {
    match parse_timestamp(text) {
        Some(secs) => FeedValue::Timestamp(secs),
        None => {
            tracing::warn!(value = text, "unparseable feed date, keeping text");
            FeedValue::Text(text.to_owned())
        }
    }
}

/// Parses an RFC 3339 (Atom) or RFC 2822 (RSS-style) date into epoch seconds.
///
/// Dates without an offset are read as UTC.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|dt| dt.timestamp())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc().timestamp())
        })
}
