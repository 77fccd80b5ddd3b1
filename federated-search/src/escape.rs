//! Markup escaping for values lifted out of XML feeds.
//!
//! Feed and nested-content parsing decode entities on read, so every text
//! leaf taken from an XML source is escaped exactly once before it lands in
//! a record. Escaping is not idempotent: `&amp;` becomes `&amp;amp;`.

use serde_json::Value;

/// Encodes `&`, `<`, `>`, `"` and `'` for safe redisplay as markup.
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Escapes every string leaf of a structured value.
///
/// Object keys, numbers, booleans and nulls are left as they are.
pub fn escape_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(escape_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (key, escape_value(inner)))
                .collect(),
        ),
        other => other,
    }
}
