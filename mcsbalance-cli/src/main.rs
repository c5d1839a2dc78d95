// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! MCS balance exporter - publishes MCS cloud account balances as
//! Prometheus metrics.
//!
//! # Examples
//!
//! ```bash
//! # Credentials come from the environment (or a .env file)
//! export MCS_LOGIN=me@example.com
//! export MCS_PASSWORD=...
//!
//! # Defaults: listen on 0.0.0.0:9601, refresh every 300 seconds
//! mcsbalance-exporter
//!
//! # Refresh every minute, retry every 5 seconds on errors
//! mcsbalance-exporter --interval 60 --retry-interval 5
//! ```

mod poller;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mcsbalance_core::{Credentials, Redactor};
use mcsbalance_fetch::{DEFAULT_API_URL, Endpoints, McsClient};
use mcsbalance_store::BalanceGauges;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use poller::{PollSettings, Poller};

// ============================================================================
// CLI Definition
// ============================================================================

/// MCS balance exporter.
#[derive(Debug, Parser)]
#[command(name = "mcsbalance-exporter")]
#[command(about = "Prometheus exporter for MCS cloud account balances")]
#[command(long_about = r#"
Signs in to the MCS billing API, reads the balance of every project the
account can access, and serves the values on /metrics.

Credentials are read from the MCS_LOGIN and MCS_PASSWORD environment
variables. A .env file in the working directory is loaded first.
"#)]
#[command(version)]
pub struct Cli {
    /// The address to listen on for HTTP requests.
    #[arg(long, default_value = "0.0.0.0:9601")]
    pub listen_address: SocketAddr,

    /// Interval (in seconds) between balance requests.
    #[arg(
        long,
        default_value_t = poller::DEFAULT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Interval (in seconds) between balance requests after an error.
    #[arg(
        long,
        default_value_t = poller::DEFAULT_RETRY_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub retry_interval: u64,

    /// Consecutive failed updates before the retry limit is reported.
    #[arg(
        long,
        default_value_t = poller::DEFAULT_RETRY_LIMIT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub retry_limit: u32,

    /// Timeout (in seconds) of each request to the MCS API.
    #[arg(
        long,
        default_value_t = mcsbalance_fetch::DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout: u64,

    /// Base URL of the MCS API.
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Verbose output (show debug info).
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Polling loop timing from the flags.
    fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.interval),
            retry_interval: Duration::from_secs(self.retry_interval),
            retry_limit: self.retry_limit,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "mcsbalance=debug,info"
    } else {
        "mcsbalance=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting MCS balance exporter");

    let credentials = Credentials::from_env().context("Configuration error")?;
    let endpoints = Endpoints::new(&cli.api_url).context("Configuration error")?;
    let redactor = Redactor::new(&credentials);

    let client = McsClient::new(
        credentials,
        endpoints,
        Duration::from_secs(cli.request_timeout),
    )
    .context("Failed to build HTTP client")?;
    let gauges = Arc::new(BalanceGauges::new().context("Failed to register metrics")?);

    let listener = TcpListener::bind(cli.listen_address)
        .await
        .with_context(|| format!("Failed to listen on {}", cli.listen_address))?;

    let poller = Poller::new(client, Arc::clone(&gauges), cli.poll_settings(), redactor);
    tokio::spawn(poller.run());

    info!(
        address = %cli.listen_address,
        "MCS balance exporter has been started at address {}",
        cli.listen_address
    );
    info!("Exporter will update balance every {} seconds", cli.interval);

    server::serve(listener, server::router(gauges), async {
        server::shutdown_signal().await;
        info!("MCS balance exporter shutdown");
    })
    .await
    .context("Metrics server failed")?;

    Ok(())
}
