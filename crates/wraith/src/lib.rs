//! Wraith is a programmable HTTP(S) test double. Callers prime it at
//! runtime with request patterns and canned responses, point the system
//! under test at it, and afterwards inspect or verify what was called.
//!
//! The server can be driven two ways: over the wire through the zombie
//! control header, or in-process through the [`Wraith`] handle:
//!
//! ```no_run
//! use wraith::{AppResponse, RequestPattern, ServerOptions, Wraith};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let server = Wraith::start(ServerOptions::default()).await?;
//! server.prime(RequestPattern::get("/health"), AppResponse::ok());
//! let base = format!("http://localhost:{}", server.http_port());
//! // exercise the system under test against `base`, then:
//! server.verify(&RequestPattern::get("/health"), &Default::default())?;
//! # Ok(())
//! # }
//! ```

mod config;
mod history;
mod model;
mod priming;
mod server;
mod template;
mod verification;

pub use config::{ConfigError, HttpsOptions, ServerOptions};
pub use history::{BoundedHistory, Exchange};
pub use model::{
    AppRequest, AppResponse, BodyContent, BodyPattern, DefaultResponse, RequestPattern,
    ValueMatcher,
};
pub use priming::{DefaultSnapshot, DefaultingQueue, PrimedMapping, PrimedResponses, PrimingStore};
pub use server::{PrimingError, ZombiePriming};
pub use verification::{VerificationCriteria, VerificationError};

pub use config::validate_capacity;

use anyhow::Context;
use rustls::pki_types::CertificateDer;
use server::ServerState;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

/// A running server instance and its in-process control handle.
///
/// Dropping the handle stops the listeners.
pub struct Wraith {
    state: Arc<ServerState>,
    http_port: u16,
    https_port: Option<u16>,
    certificate_chain: Vec<CertificateDer<'static>>,
    handles: Vec<JoinHandle<()>>,
}

impl Wraith {
    /// Binds the listeners, loads the initial priming file if one is
    /// configured, and starts serving.
    pub async fn start(options: ServerOptions) -> Result<Wraith, anyhow::Error> {
        let state = Arc::new(ServerState::new(&options));

        if let Some(path) = &options.priming_file {
            let count = load_priming_file(&state, path)?;
            info!(mappings = count, file = %path.display(), "initial priming loaded");
        }

        let http_listener = TcpListener::bind(("0.0.0.0", options.http_port))
            .await
            .with_context(|| format!("Failed to bind HTTP port {}", options.http_port))?;
        let http_port = http_listener.local_addr()?.port();
        info!("Listening on http://0.0.0.0:{http_port}");

        let mut handles = vec![tokio::spawn(server::serve(
            http_listener,
            Arc::clone(&state),
            None,
        ))];

        let mut https_port = None;
        let mut certificate_chain = Vec::new();
        if let Some(https) = &options.https {
            let (acceptor, certs) =
                server::create_tls_acceptor(&https.cert_path, &https.key_path)?;
            let https_listener = TcpListener::bind(("0.0.0.0", https.port))
                .await
                .with_context(|| format!("Failed to bind HTTPS port {}", https.port))?;
            let port = https_listener.local_addr()?.port();
            info!("Listening on https://0.0.0.0:{port}");
            https_port = Some(port);
            certificate_chain = certs;
            handles.push(tokio::spawn(server::serve(
                https_listener,
                Arc::clone(&state),
                Some(acceptor),
            )));
        }

        Ok(Wraith {
            state,
            http_port,
            https_port,
            certificate_chain,
            handles,
        })
    }

    /// The bound HTTP port. Useful when started on port zero.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn https_port(&self) -> Option<u16> {
        self.https_port
    }

    /// The server's certificate chain, for clients that need to trust a
    /// self-signed HTTPS listener. Empty when HTTPS is not configured.
    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.certificate_chain
    }

    /// Queues `response` for requests matching `pattern`.
    pub fn prime(&self, pattern: RequestPattern, response: AppResponse) {
        self.state.store.add(pattern, response);
    }

    /// Sets the fallback served for `pattern` once its queue is drained.
    /// Dynamic defaults are only available through this in-process handle.
    pub fn prime_default(&self, pattern: RequestPattern, default: DefaultResponse) {
        self.state.store.add_default(pattern, default);
    }

    pub fn prime_mappings(&self, mappings: Vec<PrimedMapping>) {
        for mapping in mappings {
            self.state.store.add_mapping(mapping);
        }
    }

    /// Loads a priming file, returning the number of mappings added.
    pub fn prime_file(&self, path: &Path) -> Result<usize, anyhow::Error> {
        load_priming_file(&self.state, path)
    }

    /// Point-in-time snapshot of all current priming.
    pub fn current_priming(&self) -> Vec<PrimedMapping> {
        self.state.store.snapshot()
    }

    /// Matched exchanges, oldest first.
    pub fn history(&self) -> Vec<Exchange> {
        self.state.call_history.values()
    }

    /// Requests that matched no priming, oldest first.
    pub fn failed_requests(&self) -> Vec<AppRequest> {
        self.state.failed_requests.values()
    }

    /// Number of recorded calls matching `pattern`.
    pub fn count(&self, pattern: &RequestPattern) -> usize {
        verification::count_invocations(&self.state.call_history, pattern)
    }

    /// Checks the call count of `pattern` against `criteria`.
    pub fn verify(
        &self,
        pattern: &RequestPattern,
        criteria: &VerificationCriteria,
    ) -> Result<(), VerificationError> {
        verification::verify(&self.state.call_history, pattern, criteria)
    }

    /// Clears all priming and both history caches.
    pub fn reset(&self) {
        self.state.reset();
    }

    /// Stops the listeners.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Wraith {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn load_priming_file(state: &ServerState, path: &Path) -> Result<usize, anyhow::Error> {
    let contents = std::fs::read(path)
        .with_context(|| format!("Failed to read priming file '{}'", path.display()))?;
    let mappings: Vec<PrimedMapping> = serde_json::from_slice(&contents)
        .with_context(|| format!("Failed to parse priming file '{}'", path.display()))?;
    let count = mappings.len();
    for mapping in mappings {
        state.store.add_mapping(mapping);
    }
    Ok(count)
}
