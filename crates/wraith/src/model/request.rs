//! Request pattern and concrete request value types.

use super::body::{BodyContent, BodyPattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar matcher: either an exact string or a full-string regex.
///
/// Wire format is untagged: a plain string is exact, `{"regex": "..."}`
/// matches the whole value against the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueMatcher {
    Exact(String),
    Regex { regex: String },
}

impl ValueMatcher {
    pub fn exact(value: impl Into<String>) -> ValueMatcher {
        ValueMatcher::Exact(value.into())
    }

    pub fn regex(pattern: impl Into<String>) -> ValueMatcher {
        ValueMatcher::Regex {
            regex: pattern.into(),
        }
    }
}

/// An immutable request-matching pattern.
///
/// Method and path are optional so that primings uploaded over the control
/// plane can inherit them from the transport request that carried them.
/// Query parameters and headers are subset constraints: parameters the
/// pattern does not declare are ignored on the concrete request.
///
/// Two patterns are used interchangeably as a store key when method, path,
/// query parameters and body matcher are equal; headers deliberately do not
/// participate in the key (see [`HeaderlessKey`]) but do participate in
/// matching.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    /// Expected method, case-insensitive. `None` matches any method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Expected path, exact or regex. `None` matches any path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ValueMatcher>,
    /// Expected query parameters, name to ordered value sequence.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Vec<String>>,
    /// Expected headers, name (case-insensitive) to ordered value sequence.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Body matcher. Absent means the request must have no body.
    #[serde(default, skip_serializing_if = "BodyPattern::is_none")]
    pub body: BodyPattern,
}

impl RequestPattern {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> RequestPattern {
        RequestPattern {
            method: Some(method.into()),
            path: Some(ValueMatcher::Exact(path.into())),
            ..RequestPattern::default()
        }
    }

    pub fn get(path: impl Into<String>) -> RequestPattern {
        RequestPattern::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> RequestPattern {
        RequestPattern::new("POST", path)
    }

    pub fn put(path: impl Into<String>) -> RequestPattern {
        RequestPattern::new("PUT", path)
    }

    pub fn delete(path: impl Into<String>) -> RequestPattern {
        RequestPattern::new("DELETE", path)
    }

    pub fn head(path: impl Into<String>) -> RequestPattern {
        RequestPattern::new("HEAD", path)
    }

    /// Pattern matching any method on the given path.
    pub fn any(path: impl Into<String>) -> RequestPattern {
        RequestPattern {
            method: None,
            path: Some(ValueMatcher::Exact(path.into())),
            ..RequestPattern::default()
        }
    }

    pub fn with_path_matcher(mut self, matcher: ValueMatcher) -> Self {
        self.path = Some(matcher);
        self
    }

    /// Appends an expected value to a query parameter constraint.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Appends an expected value to a header constraint.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: BodyPattern) -> Self {
        self.body = body;
        self
    }

    /// The header-stripped projection used as the store index key.
    pub fn headerless_key(&self) -> HeaderlessKey {
        HeaderlessKey {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
        }
    }
}

/// A request pattern projection omitting headers.
///
/// Used purely as the priming store's narrowing key: patterns that differ
/// only by headers share a key, which keeps the exact-key fast path cheap
/// while headers are still enforced by the match predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderlessKey {
    pub method: Option<String>,
    pub path: Option<ValueMatcher>,
    pub query: BTreeMap<String, Vec<String>>,
    pub body: BodyPattern,
}

/// A concrete inbound request, as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyContent>,
}

impl AppRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> AppRequest {
        AppRequest {
            method: method.into(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: BodyContent) -> Self {
        self.body = Some(body);
        self
    }

    /// The header-stripped key this request would occupy if its exact shape
    /// had been primed. Drives the store's fast-path lookup.
    pub fn headerless_projection(&self) -> HeaderlessKey {
        HeaderlessKey {
            method: Some(self.method.clone()),
            path: Some(ValueMatcher::Exact(self.path.clone())),
            query: self.query.clone(),
            body: BodyPattern::projection(self.body.as_ref()),
        }
    }
}
