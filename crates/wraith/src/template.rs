//! Response body templating against the originating request.
//!
//! Responses primed with `templated: true` may embed `${request.*}`
//! placeholders in their body:
//!
//! - `${request.method}` - the HTTP method
//! - `${request.path}` - the request path
//! - `${request.body}` - the textual form of the request body
//! - `${request.query.<name>}` - first value of a query parameter
//! - `${request.headers.<name>}` - first value of a header (case-insensitive)
//!
//! Unresolvable placeholders render as the empty string.

use crate::model::{AppRequest, AppResponse, BodyContent};
use regex::Regex;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\$\{request\.([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)?)\}")
            .expect("placeholder regex is valid")
    })
}

/// Looks up a dotted placeholder path against the request.
fn lookup(request: &AppRequest, path: &str) -> Option<String> {
    let parts: Vec<&str> = path.splitn(2, '.').collect();
    match parts.as_slice() {
        ["method"] => Some(request.method.clone()),
        ["path"] => Some(request.path.clone()),
        ["body"] => Some(
            request
                .body
                .as_ref()
                .map(BodyContent::as_text)
                .unwrap_or_default(),
        ),
        ["query", name] => request
            .query
            .get(*name)
            .and_then(|values| values.first())
            .cloned(),
        ["headers", name] => request
            .headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .cloned(),
        _ => None,
    }
}

fn render_str(template: &str, request: &AppRequest) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures| {
            lookup(request, &caps[1]).unwrap_or_default()
        })
        .to_string()
}

/// Renders placeholders inside a JSON value. Substitution happens in string
/// leaves only; structure, numbers and booleans pass through untouched.
fn render_value(value: &serde_json::Value, request: &AppRequest) -> serde_json::Value {
    match value {
        serde_json::Value::String(text) => serde_json::Value::String(render_str(text, request)),
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.iter().map(|item| render_value(item, request)).collect(),
        ),
        serde_json::Value::Object(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(name, item)| (name.clone(), render_value(item, request)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Renders the body of a templated response against `request`. Responses
/// not marked templated, or without a body, come back unchanged.
pub fn render(response: AppResponse, request: &AppRequest) -> AppResponse {
    if !response.templated {
        return response;
    }
    let body = match response.body {
        Some(BodyContent::Text(text)) => Some(BodyContent::Text(render_str(&text, request))),
        Some(BodyContent::Json(value)) => Some(BodyContent::Json(render_value(&value, request))),
        None => None,
    };
    AppResponse { body, ..response }
}
