//! HTTP(S) transport: shared state, listeners and control/app dispatch.

mod app;
mod control;
mod tls;

pub use control::{PrimingError, ZombiePriming};
pub(crate) use tls::create_tls_acceptor;

use crate::config::ServerOptions;
use crate::history::{BoundedHistory, Exchange};
use crate::model::AppRequest;
use crate::priming::PrimingStore;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, warn};

/// State shared by every connection: the priming store and both caches.
pub(crate) struct ServerState {
    pub zombie_header_name: String,
    pub store: PrimingStore,
    pub call_history: BoundedHistory<Exchange>,
    pub failed_requests: BoundedHistory<AppRequest>,
}

impl ServerState {
    pub fn new(options: &ServerOptions) -> ServerState {
        ServerState {
            zombie_header_name: options.zombie_header_name.clone(),
            store: PrimingStore::new(),
            call_history: BoundedHistory::new(options.call_history_capacity),
            failed_requests: BoundedHistory::new(options.failed_requests_capacity),
        }
    }

    /// Clears all priming and both history caches.
    pub fn reset(&self) {
        self.store.reset();
        self.call_history.clear();
        self.failed_requests.clear();
    }
}

/// Accept loop for one listener. Each connection is served on its own task;
/// the optional acceptor adds a TLS handshake in front of HTTP/1.1.
pub(crate) async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    tls_acceptor: Option<TlsAcceptor>,
) {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                error!("Failed to accept connection: {err}");
                continue;
            }
        };
        let state = Arc::clone(&state);
        let tls_acceptor = tls_acceptor.clone();

        tokio::spawn(async move {
            match tls_acceptor {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        let io = TokioIo::new(tls_stream);
                        let service = service_fn(move |req| dispatch(Arc::clone(&state), req));
                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            error!("Error serving HTTPS connection from {remote_addr}: {err}");
                        }
                    }
                    Err(err) => {
                        error!("TLS handshake failed from {remote_addr}: {err}");
                    }
                },
                None => {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| dispatch(Arc::clone(&state), req));
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving HTTP connection from {remote_addr}: {err}");
                    }
                }
            }
        });
    }
}

/// Routes a request to the control plane when it carries the zombie header,
/// otherwise to the app plane.
async fn dispatch(
    state: Arc<ServerState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!("Failed to read request body: {err}");
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                "failed to read request body",
            ));
        }
    };

    let operation = parts
        .headers
        .get(state.zombie_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match operation {
        Some(operation) => {
            debug!(operation, "control plane request");
            Ok(control::handle(&state, &operation, &parts, &bytes))
        }
        None => Ok(app::handle(&state, app::build_request(&parts, &bytes)).await),
    }
}

pub(crate) fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let bytes = Bytes::from(body.to_string());
    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(Full::new(bytes))
        .unwrap_or_else(|err| {
            error!("Failed to build response: {err}");
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}
