//! Control plane: priming uploads, snapshots and lifecycle operations,
//! selected by the value of the zombie header.

use super::{error_response, json_response, ServerState};
use crate::model::{DefaultResponse, RequestPattern, ValueMatcher};
use crate::priming::PrimedMapping;
use crate::verification::count_invocations;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

/// Wire shape of a single priming upload: one pattern, one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZombiePriming {
    pub request: RequestPattern,
    pub response: crate::model::AppResponse,
}

#[derive(Debug, Error)]
pub enum PrimingError {
    #[error("malformed priming body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown zombie operation '{0}'")]
    UnknownOperation(String),
}

/// Executes one control operation. Failures map to a 400 with a JSON error
/// body; the connection itself is never failed.
pub(crate) fn handle(
    state: &ServerState,
    operation: &str,
    parts: &Parts,
    body: &[u8],
) -> Response<Full<Bytes>> {
    match apply(state, operation, parts, body) {
        Ok(response) => response,
        Err(err) => {
            warn!(operation, "control request rejected: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn apply(
    state: &ServerState,
    operation: &str,
    parts: &Parts,
    body: &[u8],
) -> Result<Response<Full<Bytes>>, PrimingError> {
    match operation {
        "priming" => {
            let priming = normalize(serde_json::from_slice(body)?, parts);
            info!(pattern = ?priming.request, "priming added");
            state
                .store
                .add(priming.request.clone(), priming.response.clone());
            Ok(json_response(
                StatusCode::CREATED,
                &serde_json::to_value(&priming)?,
            ))
        }
        "priming-default" => {
            let priming = normalize(serde_json::from_slice(body)?, parts);
            info!(pattern = ?priming.request, "default priming set");
            state.store.add_default(
                priming.request.clone(),
                DefaultResponse::Static(priming.response.clone()),
            );
            Ok(json_response(
                StatusCode::CREATED,
                &serde_json::to_value(&priming)?,
            ))
        }
        "priming-file" => {
            let mappings: Vec<PrimedMapping> = serde_json::from_slice(body)?;
            info!(mappings = mappings.len(), "bulk priming uploaded");
            let count = mappings.len();
            for mapping in mappings {
                state.store.add_mapping(mapping);
            }
            Ok(json_response(StatusCode::CREATED, &json!({ "primed": count })))
        }
        "current" => Ok(json_response(
            StatusCode::OK,
            &serde_json::to_value(state.store.snapshot())?,
        )),
        "history" => Ok(json_response(
            StatusCode::OK,
            &serde_json::to_value(state.call_history.values())?,
        )),
        "failed" => Ok(json_response(
            StatusCode::OK,
            &serde_json::to_value(state.failed_requests.values())?,
        )),
        "count" => {
            let pattern: RequestPattern = serde_json::from_slice(body)?;
            let count = count_invocations(&state.call_history, &pattern);
            Ok(json_response(StatusCode::OK, &json!({ "count": count })))
        }
        "reset" => {
            info!("priming and history reset");
            state.reset();
            Ok(json_response(StatusCode::OK, &json!({ "message": "reset" })))
        }
        "up" => Ok(json_response(StatusCode::OK, &json!({ "message": "up" }))),
        other => Err(PrimingError::UnknownOperation(other.to_string())),
    }
}

/// A priming whose pattern omits method or path inherits them from the
/// transport request that carried the upload.
fn normalize(mut priming: ZombiePriming, parts: &Parts) -> ZombiePriming {
    if priming.request.method.is_none() {
        priming.request.method = Some(parts.method.to_string());
    }
    if priming.request.path.is_none() {
        priming.request.path = Some(ValueMatcher::exact(parts.uri.path()));
    }
    priming
}
