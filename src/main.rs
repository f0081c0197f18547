//! mtls-responder
//!
//! ```text
//!     Client ──TCP──▶ listener ──▶ TLS handshake ──▶ authorize peer cert
//!                                                         │
//!                                                         ▼
//!     Client ◀── 200 payload / 401 reason ◀── handler ◀── hyper
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mtls_responder::config::{load_config, ObservabilityConfig, Overrides};
use mtls_responder::lifecycle::{signals, start, Shutdown};
use mtls_responder::observability::logging;

#[derive(Parser)]
#[command(name = "mtls-responder")]
#[command(about = "HTTPS responder that checks client certificates", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server certificate chain (PEM)
    #[arg(long)]
    cert: Option<String>,

    /// Server private key (PEM)
    #[arg(long)]
    key: Option<String>,

    /// CA bundle trusted for client certificates (PEM)
    #[arg(long)]
    ca: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            cert_path: self.cert.clone(),
            key_path: self.key.clone(),
            ca_path: self.ca.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: mtls_responder::ResponderConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.bind_address(),
        tls = config.tls.enabled,
        request_client_cert = config.tls.request_client_cert,
        reject_unauthorized = config.tls.reject_unauthorized,
        "Configuration loaded"
    );

    let (server, listener) = start(config).await?;

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::listen_for_signals(signal_shutdown).await {
            tracing::error!(error = %e, "Failed to install signal handlers");
        }
    });

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
