//! Catalog Redirect Service
//!
//! Answers requests for legacy catalog URLs (classic WebPAC, Encore) with a
//! redirect to the equivalent page of the current catalogs.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                  REDIRECT SERVICE                     │
//!                     │                                                       │
//!   Client Request    │  ┌─────────┐    ┌─────────────┐    ┌──────────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│   routing   │───▶│    rules     │  │
//!                     │  │ server  │    │   policy    │    │  dispatcher  │  │
//!                     │  └─────────┘    └─────────────┘    └──────┬───────┘  │
//!                     │                                           │          │
//!                     │                                           ▼          │
//!   Redirect          │  ┌─────────┐                       ┌──────────────┐  │
//!   ◀─────────────────┼──│response │                       │    lookup    │──┼──▶ Platform API
//!                     │  └─────────┘                       │  classifier  │  │
//!                     │                                    └──────────────┘  │
//!                     │  ┌────────────────────────────────────────────────┐  │
//!                     │  │ config │ observability │ security │ lifecycle   │  │
//!                     │  └────────────────────────────────────────────────┘  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use catalog_redirect::config::load_config;
use catalog_redirect::lifecycle::{shutdown_on_signal, Shutdown};
use catalog_redirect::observability::{logging, metrics};
use catalog_redirect::HttpServer;

#[derive(Parser)]
#[command(name = "catalog-redirect")]
#[command(about = "Redirects legacy catalog URLs to the current catalogs", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CATALOG_REDIRECT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "catalog-redirect starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        research_catalog = %config.catalogs.research_catalog_url,
        vega = %config.catalogs.vega_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let stopped = shutdown.signalled();
    shutdown_on_signal(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
