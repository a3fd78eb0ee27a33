//! Canned response values and the default-response fallback variants.

use super::body::BodyContent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

fn default_status_code() -> u16 {
    200
}

/// An immutable canned response delivered for a matched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppResponse {
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyContent>,
    /// When set, `${request.*}` placeholders in the body are rendered
    /// against the originating request at delivery time.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
    /// Delay before delivery, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl Default for AppResponse {
    fn default() -> Self {
        AppResponse {
            status_code: default_status_code(),
            headers: BTreeMap::new(),
            body: None,
            templated: false,
            delay: None,
        }
    }
}

impl AppResponse {
    pub fn status(status_code: u16) -> AppResponse {
        AppResponse {
            status_code,
            ..AppResponse::default()
        }
    }

    pub fn ok() -> AppResponse {
        AppResponse::status(200)
    }

    pub fn created() -> AppResponse {
        AppResponse::status(201)
    }

    pub fn no_content() -> AppResponse {
        AppResponse::status(204)
    }

    pub fn not_found() -> AppResponse {
        AppResponse::status(404)
    }

    pub fn internal_server_error() -> AppResponse {
        AppResponse::status(500)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: BodyContent) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json_body(self, value: serde_json::Value) -> Self {
        self.with_body(BodyContent::from(value))
    }

    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Some(millis);
        self
    }

    pub fn templated(mut self) -> Self {
        self.templated = true;
        self
    }
}

/// Producer of fallback responses, invoked fresh on every fallback delivery.
pub trait ResponseProducer: Send + Sync {
    fn produce(&self) -> AppResponse;
}

impl<F> ResponseProducer for F
where
    F: Fn() -> AppResponse + Send + Sync,
{
    fn produce(&self) -> AppResponse {
        self()
    }
}

/// Fallback response served once a pattern's primed queue is drained.
///
/// A static default returns the same fixed response on every delivery; a
/// dynamic default invokes its producer each time, so successive fallback
/// deliveries may differ. Defaults are never exhausted by consumption.
#[derive(Clone)]
pub enum DefaultResponse {
    Static(AppResponse),
    Dynamic(Arc<dyn ResponseProducer>),
}

impl DefaultResponse {
    pub fn fixed(response: AppResponse) -> DefaultResponse {
        DefaultResponse::Static(response)
    }

    pub fn dynamic<F>(producer: F) -> DefaultResponse
    where
        F: Fn() -> AppResponse + Send + Sync + 'static,
    {
        DefaultResponse::Dynamic(Arc::new(producer))
    }

    /// Evaluates the default for one delivery.
    pub fn respond(&self) -> AppResponse {
        match self {
            DefaultResponse::Static(response) => response.clone(),
            DefaultResponse::Dynamic(producer) => producer.produce(),
        }
    }
}

impl fmt::Debug for DefaultResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultResponse::Static(response) => {
                f.debug_tuple("Static").field(response).finish()
            }
            DefaultResponse::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
