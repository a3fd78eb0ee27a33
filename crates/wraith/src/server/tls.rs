//! TLS listener setup from PEM certificate and key files.

use rustls::pki_types::CertificateDer;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Creates a TLS acceptor from PEM files, returning the parsed certificate
/// chain alongside it so callers can hand the chain to clients that need to
/// trust a self-signed server.
pub fn create_tls_acceptor(
    cert_path: &Path,
    key_path: &Path,
) -> Result<(TlsAcceptor, Vec<CertificateDer<'static>>), anyhow::Error> {
    let cert_file = std::fs::File::open(cert_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to open certificate file '{}': {e}",
            cert_path.display()
        )
    })?;
    let mut cert_reader = std::io::BufReader::new(cert_file);
    let certs: Vec<CertificateDer> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow::anyhow!("Failed to parse certificate file: {e}"))?;

    if certs.is_empty() {
        anyhow::bail!(
            "No certificates found in certificate file: {}",
            cert_path.display()
        );
    }

    let key_file = std::fs::File::open(key_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to open private key file '{}': {e}",
            key_path.display()
        )
    })?;
    let mut key_reader = std::io::BufReader::new(key_file);

    // PKCS8, RSA or EC keys are all accepted
    let key = rustls_pemfile::private_key(&mut key_reader)
        .map_err(|e| anyhow::anyhow!("Failed to parse private key file: {e}"))?
        .ok_or_else(|| {
            anyhow::anyhow!("No private key found in key file: {}", key_path.display())
        })?;

    // Pin the provider so the config builds regardless of which crypto
    // backends ended up in the feature set.
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| anyhow::anyhow!("Failed to select TLS protocol versions: {e}"))?
        .with_no_client_auth()
        .with_single_cert(certs.clone(), key)
        .map_err(|e| anyhow::anyhow!("Failed to build TLS configuration: {e}"))?;

    Ok((TlsAcceptor::from(Arc::new(config)), certs))
}
