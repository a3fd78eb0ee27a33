//! The pure request-matching predicate.
//!
//! `matches` is side-effect free and callable from any number of threads
//! without synchronization; regexes are compiled on demand and an invalid
//! pattern simply fails to match.

use super::body::{BodyContent, BodyPattern};
use super::request::{AppRequest, RequestPattern, ValueMatcher};
use std::collections::BTreeMap;

/// Returns true when `request` satisfies every constraint of `pattern`.
///
/// Query parameters and headers are subset constraints: every declared
/// name must be present with an equal value sequence, undeclared names on
/// the request are ignored. Header names compare case-insensitively.
pub fn matches(pattern: &RequestPattern, request: &AppRequest) -> bool {
    method_matches(pattern.method.as_deref(), &request.method)
        && path_matches(pattern.path.as_ref(), &request.path)
        && query_matches(&pattern.query, &request.query)
        && headers_match(&pattern.headers, &request.headers)
        && body_matches(&pattern.body, request.body.as_ref())
}

fn method_matches(expected: Option<&str>, actual: &str) -> bool {
    match expected {
        None => true,
        Some(method) => method.eq_ignore_ascii_case(actual),
    }
}

fn path_matches(expected: Option<&ValueMatcher>, actual: &str) -> bool {
    match expected {
        None => true,
        Some(ValueMatcher::Exact(path)) => path == actual,
        Some(ValueMatcher::Regex { regex }) => full_match(regex, actual),
    }
}

fn query_matches(
    expected: &BTreeMap<String, Vec<String>>,
    actual: &BTreeMap<String, Vec<String>>,
) -> bool {
    expected
        .iter()
        .all(|(name, values)| actual.get(name).is_some_and(|found| found == values))
}

fn headers_match(
    expected: &BTreeMap<String, Vec<String>>,
    actual: &BTreeMap<String, Vec<String>>,
) -> bool {
    expected.iter().all(|(name, values)| {
        actual
            .iter()
            .find(|(found, _)| found.eq_ignore_ascii_case(name))
            .is_some_and(|(_, found)| found == values)
    })
}

fn body_matches(pattern: &BodyPattern, body: Option<&BodyContent>) -> bool {
    match pattern {
        BodyPattern::None => body.is_none_or(BodyContent::is_empty),
        BodyPattern::Literal(expected) => {
            body.is_some_and(|content| content.as_text() == *expected)
        }
        BodyPattern::Regex(regex) => body.is_some_and(|content| full_match(regex, &content.as_text())),
        BodyPattern::Json(expected) => match body {
            Some(BodyContent::Json(actual)) => json_matches(expected, actual),
            _ => false,
        },
    }
}

/// Structural JSON matching.
///
/// Objects match when every declared key is present with a matching value
/// (extra keys on the concrete body are ignored). Arrays match positionally
/// with equal length. String leaves match exactly or as an anchored regex
/// against the textual form of the concrete leaf; other scalars compare by
/// equality.
pub(crate) fn json_matches(pattern: &serde_json::Value, actual: &serde_json::Value) -> bool {
    use serde_json::Value;

    match (pattern, actual) {
        (Value::Object(expected), Value::Object(found)) => expected
            .iter()
            .all(|(key, value)| found.get(key).is_some_and(|v| json_matches(value, v))),
        (Value::Array(expected), Value::Array(found)) => {
            expected.len() == found.len()
                && expected
                    .iter()
                    .zip(found.iter())
                    .all(|(e, f)| json_matches(e, f))
        }
        (Value::String(expected), Value::String(found)) => {
            expected == found || full_match(expected, found)
        }
        (Value::String(expected), Value::Number(found)) => full_match(expected, &found.to_string()),
        (Value::String(expected), Value::Bool(found)) => full_match(expected, &found.to_string()),
        (expected, found) => expected == found,
    }
}

/// Full-string regex match. Invalid patterns never match.
pub(crate) fn full_match(pattern: &str, actual: &str) -> bool {
    regex::Regex::new(&format!("^(?:{pattern})$"))
        .map(|re| re.is_match(actual))
        .unwrap_or(false)
}
