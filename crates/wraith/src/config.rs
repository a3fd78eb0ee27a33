//! Server options and capacity validation.

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ZOMBIE_HEADER_NAME: &str = "zombie";
pub const DEFAULT_CALL_HISTORY_CAPACITY: usize = 1000;
pub const DEFAULT_FAILED_REQUESTS_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("capacity must not be negative, got {0}")]
    NegativeCapacity(i64),
}

/// Rejects negative capacities at the configuration boundary. Zero is
/// accepted and means unbounded.
pub fn validate_capacity(capacity: i64) -> Result<usize, ConfigError> {
    usize::try_from(capacity).map_err(|_| ConfigError::NegativeCapacity(capacity))
}

/// TLS listener settings. The certificate and key are PEM files on disk.
#[derive(Debug, Clone)]
pub struct HttpsOptions {
    pub port: u16,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Startup options for a server instance.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// HTTP listener port. Zero picks an ephemeral port.
    pub http_port: u16,
    /// Name of the header that routes a request to the control plane.
    pub zombie_header_name: String,
    /// Call history capacity. Zero means unbounded.
    pub call_history_capacity: usize,
    /// Failed requests capacity. Zero means unbounded.
    pub failed_requests_capacity: usize,
    /// Optional TLS listener served alongside the HTTP one.
    pub https: Option<HttpsOptions>,
    /// Optional priming file loaded before the listeners start.
    pub priming_file: Option<PathBuf>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            http_port: 0,
            zombie_header_name: DEFAULT_ZOMBIE_HEADER_NAME.to_string(),
            call_history_capacity: DEFAULT_CALL_HISTORY_CAPACITY,
            failed_requests_capacity: DEFAULT_FAILED_REQUESTS_CAPACITY,
            https: None,
            priming_file: None,
        }
    }
}

impl ServerOptions {
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn with_zombie_header_name(mut self, name: impl Into<String>) -> Self {
        self.zombie_header_name = name.into();
        self
    }

    pub fn with_call_history_capacity(mut self, capacity: usize) -> Self {
        self.call_history_capacity = capacity;
        self
    }

    pub fn with_failed_requests_capacity(mut self, capacity: usize) -> Self {
        self.failed_requests_capacity = capacity;
        self
    }

    pub fn with_https(mut self, https: HttpsOptions) -> Self {
        self.https = Some(https);
        self
    }

    pub fn with_priming_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.priming_file = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_capacity_is_rejected() {
        let err = validate_capacity(-1).unwrap_err();
        assert_eq!(err.to_string(), "capacity must not be negative, got -1");
    }

    #[test]
    fn zero_and_positive_capacities_pass() {
        assert_eq!(validate_capacity(0).unwrap(), 0);
        assert_eq!(validate_capacity(1000).unwrap(), 1000);
    }

    #[test]
    fn defaults() {
        let options = ServerOptions::default();
        assert_eq!(options.http_port, 0);
        assert_eq!(options.zombie_header_name, "zombie");
        assert_eq!(options.call_history_capacity, 1000);
        assert_eq!(options.failed_requests_capacity, 100);
        assert!(options.https.is_none());
        assert!(options.priming_file.is_none());
    }
}
