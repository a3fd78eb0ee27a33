//! Body values for concrete requests and responses, plus the body matcher
//! variants attached to request patterns.

use serde::{Deserialize, Serialize};

/// Parsed body of a concrete request or a primed response.
///
/// Raw bytes are turned into either structured JSON (objects and arrays)
/// or plain text before any matching happens, so the rest of the engine
/// never sees wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum BodyContent {
    /// A parsed JSON object or array.
    Json(serde_json::Value),
    /// Text that is not a JSON object or array.
    Text(String),
}

impl BodyContent {
    /// Build body content from raw transport bytes. Empty bodies map to `None`.
    ///
    /// Bytes are decoded as UTF-8 with invalid sequences replaced by
    /// U+FFFD; raw bytes are not retained, so literal patterns match
    /// against the normalized text, not the original bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<BodyContent> {
        if bytes.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(bytes).into_owned();
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                Some(BodyContent::Json(value))
            }
            _ => Some(BodyContent::Text(text)),
        }
    }

    pub fn json(value: serde_json::Value) -> BodyContent {
        BodyContent::Json(value)
    }

    pub fn text(value: impl Into<String>) -> BodyContent {
        BodyContent::Text(value.into())
    }

    /// Textual form used for literal and regex body matching and for
    /// serializing the body onto the wire.
    pub fn as_text(&self) -> String {
        match self {
            BodyContent::Json(value) => value.to_string(),
            BodyContent::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BodyContent::Json(_) => false,
            BodyContent::Text(text) => text.is_empty(),
        }
    }
}

impl From<serde_json::Value> for BodyContent {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => BodyContent::Text(text),
            other => BodyContent::Json(other),
        }
    }
}

impl From<BodyContent> for serde_json::Value {
    fn from(content: BodyContent) -> Self {
        match content {
            BodyContent::Json(value) => value,
            BodyContent::Text(text) => serde_json::Value::String(text),
        }
    }
}

/// Body matcher attached to a request pattern.
///
/// Wire format is externally tagged: `{"literal": "..."}`, `{"regex": "..."}`
/// or `{"json": {...}}`. An absent body field means [`BodyPattern::None`],
/// which only matches requests without a body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyPattern {
    /// Matches only an absent or empty body.
    #[default]
    None,
    /// Equality with the textual form of the request body. Bodies are
    /// normalized to UTF-8 on arrival (see [`BodyContent::from_bytes`]),
    /// so the comparison is over the normalized text.
    Literal(String),
    /// Full-string regex match over the textual form of the request body.
    Regex(String),
    /// Structural match over parsed JSON: objects by subset, arrays
    /// positionally with equal length, string leaves as anchored regexes.
    Json(serde_json::Value),
}

impl BodyPattern {
    pub fn is_none(&self) -> bool {
        matches!(self, BodyPattern::None)
    }

    /// The pattern a concrete body projects onto for the exact-key fast path.
    pub fn projection(body: Option<&BodyContent>) -> BodyPattern {
        match body {
            None => BodyPattern::None,
            Some(BodyContent::Text(text)) if text.is_empty() => BodyPattern::None,
            Some(BodyContent::Text(text)) => BodyPattern::Literal(text.clone()),
            Some(BodyContent::Json(value)) => BodyPattern::Json(value.clone()),
        }
    }
}
