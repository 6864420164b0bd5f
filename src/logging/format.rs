//! Payload normalization.
//!
//! Turns whatever an agent passed along with a call (a JSON object, a list,
//! or a string that may carry escaped and nested JSON) into readable,
//! pretty-printed text for the trace log.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

/// Escape sequences replaced by [`unescape`], applied in this order.
const ESCAPE_SEQUENCES: [(&str, &str); 5] = [
    ("\\\\", "\\"),
    ("\\n", "\n"),
    ("\\t", "\t"),
    ("\\\"", "\""),
    ("\\'", "'"),
];

/// Auxiliary data attached to a logged call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Free text, possibly holding escaped or embedded JSON.
    Text(String),
    /// Key/value data. Insertion order is kept.
    Mapping(Map<String, Value>),
    /// List data.
    Sequence(Vec<Value>),
    /// Numbers, booleans and null.
    Other(Value),
}

impl Payload {
    /// Render this payload as normalized text.
    pub fn normalize(&self) -> String {
        normalize(self)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Payload::Text(s),
            Value::Object(map) => Payload::Mapping(map),
            Value::Array(items) => Payload::Sequence(items),
            other => Payload::Other(other),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

/// Normalize a payload into human-readable text.
///
/// Mappings and sequences are pretty-printed directly. Text is
/// escape-normalized and, when it holds a JSON object or array, re-parsed and
/// pretty-printed with every nested string normalized as well. Text that is
/// not JSON is kept, except that each of its lines is pretty-printed on its
/// own when it parses. This never fails.
pub fn normalize(payload: &Payload) -> String {
    match payload {
        Payload::Mapping(map) => to_pretty_json(map),
        Payload::Sequence(items) => to_pretty_json(items),
        Payload::Text(text) => normalize_text(text),
        Payload::Other(value) => value.to_string(),
    }
}

/// Replace the escape sequences in `s` with the characters they stand for.
pub fn unescape(s: &str) -> String {
    ESCAPE_SEQUENCES
        .iter()
        .fold(s.to_string(), |acc, (seq, ch)| acc.replace(seq, ch))
}

/// Serialize with a four space indent, leaving non-ASCII text as is.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut ser).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

fn normalize_text(raw: &str) -> String {
    let text = unescape(raw);

    // Unescaping can turn valid JSON into invalid JSON (a `\n` inside a
    // string value becomes a raw control character), so the raw text gets a
    // second chance.
    if let Some(container) = parse_container(&text).or_else(|| parse_container(raw)) {
        return to_pretty_json(&normalize_value(container));
    }

    if text.contains('\n') {
        return text
            .split('\n')
            .map(pretty_or_verbatim)
            .collect::<Vec<_>>()
            .join("\n");
    }

    text
}

/// Parse `s` as JSON, keeping only objects and arrays.
fn parse_container(s: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(s) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(pretty_or_verbatim(&unescape(&s))),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (key, normalize_value(val)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

fn pretty_or_verbatim(s: &str) -> String {
    match serde_json::from_str::<Value>(s) {
        Ok(value) => to_pretty_json(&value),
        Err(_) => s.to_string(),
    }
}
