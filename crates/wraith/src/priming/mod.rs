//! Priming: the indexed store of request patterns bound to response queues.

mod queue;
mod store;

pub use queue::DefaultingQueue;
pub use store::PrimingStore;

use crate::model::{AppResponse, DefaultResponse, RequestPattern};
use serde::{Deserialize, Serialize};

/// One pattern together with its queued responses, as listed by the control
/// plane and as uploaded by priming files.
///
/// Wire shape: `{"request": {...}, "responses": {"primed": [...], "default": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimedMapping {
    pub request: RequestPattern,
    pub responses: PrimedResponses,
}

/// The queue portion of a [`PrimedMapping`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimedResponses {
    #[serde(default)]
    pub primed: Vec<AppResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultSnapshot>,
}

/// Serializable view of a queue's default.
///
/// Static defaults round-trip as the response object; dynamic defaults are
/// produced in-process and cannot cross the wire, so they serialize as the
/// marker string `"dynamic"` and are dropped on upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultSnapshot {
    Response(AppResponse),
    Marker(String),
}

impl From<&DefaultResponse> for DefaultSnapshot {
    fn from(default: &DefaultResponse) -> Self {
        match default {
            DefaultResponse::Static(response) => DefaultSnapshot::Response(response.clone()),
            DefaultResponse::Dynamic(_) => DefaultSnapshot::Marker("dynamic".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BodyContent;
    use serde_json::json;

    #[test]
    fn primed_mapping_wire_round_trip() {
        let wire = json!({
            "request": {"method": "GET", "path": "/a"},
            "responses": {
                "primed": [{"statusCode": 200, "body": {"ready": true}}],
                "default": {"statusCode": 503}
            }
        });
        let mapping: PrimedMapping = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(mapping.request, RequestPattern::get("/a"));
        assert_eq!(mapping.responses.primed.len(), 1);
        assert_eq!(
            mapping.responses.primed[0].body,
            Some(BodyContent::json(json!({"ready": true})))
        );
        assert_eq!(
            mapping.responses.default,
            Some(DefaultSnapshot::Response(AppResponse::status(503)))
        );

        assert_eq!(serde_json::to_value(&mapping).unwrap(), wire);
    }

    #[test]
    fn dynamic_default_serializes_as_marker() {
        let snapshot = DefaultSnapshot::from(&DefaultResponse::dynamic(AppResponse::ok));
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!("dynamic")
        );
    }
}
