use clap::Parser;
use wraith::{validate_capacity, HttpsOptions, ServerOptions, Wraith};

/// Programmable HTTP(S) test double with runtime priming, call history and
/// invocation verification.
#[derive(Parser, Debug)]
#[command(name = "wraith", author, version, about)]
struct Args {
    /// HTTP listener port. Zero picks an ephemeral port.
    #[arg(short, long, env = "WRAITH_PORT", default_value = "8080")]
    port: u16,

    /// Name of the header that routes a request to the control plane.
    #[arg(long, env = "WRAITH_ZOMBIE_HEADER_NAME", default_value = "zombie")]
    zombie_header_name: String,

    /// Call history capacity. Zero means unbounded.
    #[arg(long, env = "WRAITH_CALL_HISTORY_CAPACITY", default_value = "1000")]
    call_history_capacity: i64,

    /// Failed requests capacity. Zero means unbounded.
    #[arg(long, env = "WRAITH_FAILED_REQUESTS_CAPACITY", default_value = "100")]
    failed_requests_capacity: i64,

    /// HTTPS listener port. Requires --cert and --key.
    #[arg(long, env = "WRAITH_HTTPS_PORT", requires_all = ["cert", "key"])]
    https_port: Option<u16>,

    /// PEM certificate chain for the HTTPS listener.
    #[arg(long, env = "WRAITH_CERT")]
    cert: Option<std::path::PathBuf>,

    /// PEM private key for the HTTPS listener.
    #[arg(long, env = "WRAITH_KEY")]
    key: Option<std::path::PathBuf>,

    /// Priming file loaded before the listeners start.
    #[arg(long, env = "WRAITH_PRIMING_FILE")]
    priming_file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut options = ServerOptions::default()
        .with_http_port(args.port)
        .with_zombie_header_name(args.zombie_header_name)
        .with_call_history_capacity(validate_capacity(args.call_history_capacity)?)
        .with_failed_requests_capacity(validate_capacity(args.failed_requests_capacity)?);

    if let (Some(port), Some(cert_path), Some(key_path)) = (args.https_port, args.cert, args.key) {
        options = options.with_https(HttpsOptions {
            port,
            cert_path,
            key_path,
        });
    }
    if let Some(path) = args.priming_file {
        options = options.with_priming_file(path);
    }

    let server = Wraith::start(options).await?;

    tokio::signal::ctrl_c().await?;
    server.stop();
    Ok(())
}
