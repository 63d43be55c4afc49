//! Probe an RTSP source without starting a session
//!
//! Run with: cargo run --example probe_source RTSP_URL [BACKEND_URL]
//!
//! Asks the backend to open the source and report whether it is readable.
//! Useful for checking camera credentials and reachability before adding
//! a stream to the grid.

use url::Url;

use streamgrid::{ClientConfig, HttpBackend, StreamBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(source) = args.first() else {
        eprintln!("Usage: probe_source RTSP_URL [BACKEND_URL]");
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match args.get(1) {
        Some(base) => ClientConfig::with_backend(&Url::parse(base)?),
        None => ClientConfig::default(),
    };

    let backend = HttpBackend::new(&config)?;

    if !backend.health().await {
        eprintln!("Backend at {} is not answering", config.api_base);
        std::process::exit(1);
    }

    let report = backend.probe_stream(source).await?;
    if report.ok {
        println!("{source}: readable");
    } else {
        println!(
            "{source}: not readable ({})",
            report.error.as_deref().unwrap_or("no detail")
        );
        std::process::exit(1);
    }

    Ok(())
}
