//! App plane: matching concrete requests against priming and delivering
//! canned responses.

use super::{error_response, ServerState};
use crate::history::Exchange;
use crate::model::{AppRequest, AppResponse, BodyContent};
use crate::template;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Response, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// Builds the transport-independent request value a hyper request maps to.
pub(crate) fn build_request(parts: &Parts, body: &[u8]) -> AppRequest {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string());
        }
    }

    AppRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parse_query(parts.uri.query()),
        headers,
        body: BodyContent::from_bytes(body),
    }
}

/// Parses a raw query string into name to ordered-value-sequence form.
/// Repeated parameters accumulate in arrival order.
fn parse_query(query: Option<&str>) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let Some(query) = query else {
        return params;
    };
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = urlencoding::decode(name)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| name.to_string());
        let value = urlencoding::decode(value)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| value.to_string());
        params.entry(name).or_default().push(value);
    }
    params
}

/// Serves one app-plane request: consume a primed response and record the
/// exchange, or record the miss and answer 404.
pub(crate) async fn handle(state: &ServerState, request: AppRequest) -> Response<Full<Bytes>> {
    match state.store.find_and_consume(&request) {
        Some(response) => {
            if let Some(millis) = response.delay {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            let response = template::render(response, &request);
            debug!(
                method = %request.method,
                path = %request.path,
                status = response.status_code,
                "delivering primed response"
            );
            state
                .call_history
                .record(Exchange::new(request, response.clone()));
            build_response(&response)
        }
        None => {
            info!(
                method = %request.method,
                path = %request.path,
                "no priming matched, recording failed request"
            );
            state.failed_requests.record(request);
            error_response(
                StatusCode::NOT_FOUND,
                "no primed response matched the request",
            )
        }
    }
}

/// Maps a canned response onto the wire. JSON bodies get an implicit
/// `application/json` content type unless the priming set one.
fn build_response(response: &AppResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }

    let bytes = match &response.body {
        None => Bytes::new(),
        Some(body) => Bytes::from(body.as_text()),
    };
    let is_json = matches!(response.body, Some(BodyContent::Json(_)));
    let has_content_type = response
        .headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case("content-type"));
    if is_json && !has_content_type {
        builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
    }

    builder.body(Full::new(bytes)).unwrap_or_else(|err| {
        error!("Primed response is not representable on the wire: {err}");
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerOptions;
    use crate::model::RequestPattern;
    use serde_json::json;

    fn state() -> ServerState {
        ServerState::new(&ServerOptions::default())
    }

    fn parts_for(method: &str, uri: &str) -> Parts {
        let request = hyper::Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Trace", "t-1")
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn build_request_captures_method_path_query_headers() {
        let parts = parts_for("POST", "/orders?page=1&page=2&q=a%20b");
        let request = build_request(&parts, br#"{"id": 7}"#);

        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/orders");
        assert_eq!(request.query["page"], vec!["1", "2"]);
        assert_eq!(request.query["q"], vec!["a b"]);
        assert_eq!(request.headers["x-trace"], vec!["t-1"]);
        assert_eq!(request.body, Some(BodyContent::json(json!({"id": 7}))));
    }

    #[test]
    fn build_request_without_body_or_query() {
        let parts = parts_for("GET", "/health");
        let request = build_request(&parts, b"");
        assert!(request.query.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn valueless_query_parameter_parses_as_empty_string() {
        let params = parse_query(Some("flag&x=1"));
        assert_eq!(params["flag"], vec![""]);
        assert_eq!(params["x"], vec!["1"]);
    }

    #[tokio::test]
    async fn match_delivers_and_records_exchange() {
        let state = state();
        state.store.add(
            RequestPattern::get("/a"),
            AppResponse::created().with_json_body(json!({"ok": true})),
        );

        let response = handle(&state, AppRequest::new("GET", "/a")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[hyper::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(state.call_history.len(), 1);
        assert!(state.failed_requests.is_empty());
    }

    #[tokio::test]
    async fn miss_answers_404_and_records_failed_request() {
        let state = state();
        let response = handle(&state, AppRequest::new("GET", "/unprimed")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(state.call_history.is_empty());
        assert_eq!(state.failed_requests.len(), 1);
        assert_eq!(state.failed_requests.values()[0].path, "/unprimed");
    }

    #[tokio::test]
    async fn templated_response_is_rendered_before_recording() {
        let state = state();
        state.store.add(
            RequestPattern::get("/echo"),
            AppResponse::ok()
                .with_json_body(json!({"path": "${request.path}"}))
                .templated(),
        );

        handle(&state, AppRequest::new("GET", "/echo")).await;
        let recorded = &state.call_history.values()[0];
        assert_eq!(
            recorded.response.body,
            Some(BodyContent::json(json!({"path": "/echo"})))
        );
    }

    #[test]
    fn explicit_content_type_is_not_overridden() {
        let response = AppResponse::ok()
            .with_header("Content-Type", "application/problem+json")
            .with_json_body(json!({"ok": true}));
        let wire = build_response(&response);
        assert_eq!(
            wire.headers()[hyper::header::CONTENT_TYPE],
            "application/problem+json"
        );
    }
}
