//! Nested XML carried inside an entry's `<content>` body.
//!
//! Every top-level element becomes one extra record field. Text-only
//! elements are scalars; elements with attributes or children become
//! objects, with attributes under `@name`, mixed text under `#text` and
//! repeated children collected into arrays.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::map::Entry;
use serde_json::{Map, Value};

use super::atom::{attribute_pairs, local_name, FeedValue};
use crate::error::SearchError;

#[derive(Debug, Default)]
struct Node {
    attributes: Vec<(String, String)>,
    children: Vec<(String, Node)>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, SearchError> {
        Ok(Self {
            attributes: attribute_pairs(start)?,
            ..Default::default()
        })
    }

    fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    fn into_value(self) -> Value {
        if self.is_leaf() {
            return Value::String(self.text);
        }
        let mut map = Map::new();
        for (name, value) in self.attributes {
            map.insert(format!("@{name}"), Value::String(value));
        }
        for (name, child) in self.children {
            let value = child.into_value();
            match map.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => match slot.get_mut() {
                    Value::Array(items) => items.push(value),
                    existing => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                },
            }
        }
        if !self.text.is_empty() {
            map.insert("#text".into(), Value::String(self.text));
        }
        Value::Object(map)
    }

    fn into_feed_value(self) -> FeedValue {
        if self.is_leaf() {
            FeedValue::Text(self.text)
        } else {
            FeedValue::Structured(self.into_value())
        }
    }
}

/// Parses a content body into `(field name, value)` pairs in document order.
///
/// Text outside any element, comments and processing instructions are
/// ignored, so a plain-text body yields no fields.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the body is not well-formed.
pub fn parse_fragment(xml: &str) -> Result<Vec<(String, FeedValue)>, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = Vec::new();
    loop {
        match reader.read_event().map_err(nested_error)? {
            Event::Start(e) => {
                let node = read_node(&mut reader, &e)?;
                fields.push((local_name(&e), node.into_feed_value()));
            }
            Event::Empty(e) => {
                let node = Node::open(&e)?;
                fields.push((local_name(&e), node.into_feed_value()));
            }
            Event::End(_) => {
                return Err(SearchError::Parse(
                    "unbalanced end tag in nested content".into(),
                ))
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(fields)
}

fn read_node(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Node, SearchError> {
    let mut node = Node::open(start)?;
    loop {
        match reader.read_event().map_err(nested_error)? {
            Event::Start(e) => {
                let child = read_node(reader, &e)?;
                node.children.push((local_name(&e), child));
            }
            Event::Empty(e) => {
                node.children.push((local_name(&e), Node::open(&e)?));
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(nested_error)?;
                node.text.push_str(&text);
            }
            Event::CData(c) => node.text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => return Ok(node),
            Event::Eof => {
                return Err(SearchError::Parse(
                    "unexpected end of nested content".into(),
                ))
            }
            _ => {}
        }
    }
}

fn nested_error(err: quick_xml::Error) -> SearchError {
    SearchError::Parse(format!("malformed nested content: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_elements_become_text() {
        let fields = parse_fragment("<score>0.95</score><lang>en</lang>").expect("parse");
        assert_eq!(
            fields,
            vec![
                ("score".to_string(), FeedValue::Text("0.95".into())),
                ("lang".to_string(), FeedValue::Text("en".into())),
            ]
        );
    }

    #[test]
    fn entities_are_decoded() {
        let fields = parse_fragment("<note>a &amp; b &lt;c&gt;</note>").expect("parse");
        assert_eq!(fields[0].1, FeedValue::Text("a & b <c>".into()));
    }

    #[test]
    fn nested_elements_become_structured() {
        let fields = parse_fragment(
            "<meta><size unit=\"kb\">12</size><tag>a</tag><tag>b</tag></meta>",
        )
        .expect("parse");
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields[0].1,
            FeedValue::Structured(json!({
                "size": {"@unit": "kb", "#text": "12"},
                "tag": ["a", "b"]
            }))
        );
    }

    #[test]
    fn empty_element_is_empty_text() {
        let fields = parse_fragment("<flag/>").expect("parse");
        assert_eq!(fields[0], ("flag".to_string(), FeedValue::Text(String::new())));
    }

    #[test]
    fn prefixed_names_use_local_part() {
        let fields = parse_fragment("<x:score xmlns:x=\"urn:x\">1</x:score>").expect("parse");
        assert_eq!(fields[0], ("score".to_string(), FeedValue::Text("1".into())));
    }

    #[test]
    fn plain_text_yields_no_fields() {
        assert!(parse_fragment("just words").expect("parse").is_empty());
        assert!(parse_fragment("").expect("parse").is_empty());
    }

    #[test]
    fn malformed_fragment_rejected() {
        assert!(parse_fragment("<a><b></a>").is_err());
        assert!(parse_fragment("<a>").is_err());
    }
}
