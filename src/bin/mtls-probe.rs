//! Issue a request to an mTLS endpoint with a client certificate and dump
//! the response.

use std::path::PathBuf;

use clap::Parser;
use reqwest::{Certificate, Identity};

#[derive(Parser)]
#[command(name = "mtls-probe")]
#[command(about = "Request an HTTPS URL with a client certificate", long_about = None)]
struct Cli {
    /// URL to request
    #[arg(default_value = "https://localhost:8080")]
    url: String,

    /// CA bundle used to verify the server (PEM)
    #[arg(long, default_value = "client/ca.pem")]
    ca: PathBuf,

    /// Client certificate (PEM). Omit to connect without one.
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Client private key (PEM)
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let ca = Certificate::from_pem(&std::fs::read(&cli.ca)?)?;
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .tls_built_in_root_certs(false)
        .add_root_certificate(ca)
        .min_tls_version(reqwest::tls::Version::TLS_1_2);

    if let Some(cert) = &cli.cert {
        let mut pem = std::fs::read(cert)?;
        if let Some(key) = &cli.key {
            pem.push(b'\n');
            pem.extend(std::fs::read(key)?);
        }
        builder = builder.identity(Identity::from_pem(&pem)?);
    }

    let client = builder.build()?;
    let res = client.get(&cli.url).send().await?;

    println!("{:?} {}", res.version(), res.status());
    for (name, value) in res.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", res.text().await?);

    Ok(())
}
