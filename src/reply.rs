//! Normalization of webhook response bodies into display text.
//!
//! The remote endpoint has no declared response shape, so a successful body
//! is sniffed: blank, plain text, or JSON carrying one of a fixed list of
//! reply fields.

use serde_json::{Number, Value};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

pub const EMPTY_RESPONSE_REPLY: &str =
    "I received your message, but the server didn't provide a response.";
pub const NO_KNOWN_FIELD_REPLY: &str =
    "I received your message, but I'm not sure how to respond right now.";
pub const FORMAT_ISSUE_REPLY: &str =
    "I received your message, but there was an issue processing the response format.";

/// JSON fields that may carry the reply, in lookup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ReplyField {
    Output,
    Reply,
    Message,
    Response,
    Text,
}

impl ReplyField {
    /// JSON key without any decoration
    pub fn key(self) -> &'static str {
        self.into()
    }
}

/// Classification of a successful (2xx) response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    Empty,
    PlainText(String),
    JsonWithField { field: ReplyField, value: String },
    JsonNoKnownField,
    ParseError,
}

impl ReplyShape {
    pub fn classify(body: &str) -> Self {
        let trimmed = trim_js_whitespace(body);
        if trimmed.is_empty() {
            return ReplyShape::Empty;
        }

        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return ReplyShape::PlainText(trimmed.to_string());
        }

        let data: Value = match serde_json::from_str(body) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("JSON parse error: {}", e);
                return ReplyShape::ParseError;
            }
        };
        tracing::debug!(?data, "parsed JSON response");

        ReplyField::iter()
            .find_map(|field| {
                data.get(field.key())
                    .filter(|value| is_truthy(value))
                    .map(|value| ReplyShape::JsonWithField {
                        field,
                        value: display_value(value),
                    })
            })
            .unwrap_or(ReplyShape::JsonNoKnownField)
    }

    pub fn into_reply(self) -> String {
        match self {
            ReplyShape::Empty => EMPTY_RESPONSE_REPLY.to_string(),
            ReplyShape::PlainText(text) => text,
            ReplyShape::JsonWithField { value, .. } => value,
            ReplyShape::JsonNoKnownField => NO_KNOWN_FIELD_REPLY.to_string(),
            ReplyShape::ParseError => FORMAT_ISSUE_REPLY.to_string(),
        }
    }
}

/// `null`, `false`, `0` and `""` do not count as a reply; anything else does.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => display_number(n),
        other => other.to_string(),
    }
}

/// Whole floats print without a fraction, the way a browser shows `1.0` as `1`.
fn display_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

/// Strip the characters an ECMAScript `trim()` strips.
///
/// Differs from [`str::trim`]: U+0085 is kept and U+FEFF is removed.
pub fn trim_js_whitespace(text: &str) -> &str {
    text.trim_matches(is_js_whitespace)
}

fn is_js_whitespace(c: char) -> bool {
    c == '\u{FEFF}' || (c != '\u{85}' && c.is_whitespace())
}
