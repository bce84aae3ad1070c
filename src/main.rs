//! Compatibility shim (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                    COMPAT SHIM                       │
//!   Client Request  │  ┌──────────┐   ┌──────────────────────────────────┐ │
//!   ────────────────┼─▶│  http    │──▶│           normalize              │ │
//!                   │  │ server   │   │ params → reasoning → sanitize →  │ │
//!                   │  │ (ingest) │   │ tool_ids                         │ │
//!                   │  └──────────┘   └───────────────┬──────────────────┘ │
//!                   │                                 ▼                    │
//!   Client Response │  ┌──────────┐            ┌──────────────┐            │
//!   ◀───────────────┼──│ response │◀───────────│   forward    │◀───────────┼── Upstream
//!                   │  │  relay   │            │ (TLS client) │            │   (443)
//!                   │  └──────────┘            └──────────────┘            │
//!                   │                                                      │
//!                   │   config · observability · lifecycle                 │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use compat_shim::config::{resolve_config, Overrides};
use compat_shim::lifecycle::Shutdown;
use compat_shim::observability::{logging, metrics};
use compat_shim::HttpServer;

#[derive(Parser)]
#[command(name = "compat-shim")]
#[command(about = "Rewrites chat requests to satisfy a strict upstream", long_about = None)]
struct Args {
    /// TOML config file.
    #[arg(short, long, env = "COMPAT_SHIM_CONFIG")]
    config: Option<PathBuf>,

    /// Full bind address, e.g. 127.0.0.1:8080.
    #[arg(long, env = "COMPAT_SHIM_BIND")]
    bind: Option<String>,

    /// Listen port (keeps the configured bind host).
    #[arg(short, long, env = "COMPAT_SHIM_PORT")]
    port: Option<u16>,

    /// Upstream hostname.
    #[arg(long, env = "COMPAT_SHIM_UPSTREAM_HOST")]
    upstream_host: Option<String>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, env = "COMPAT_SHIM_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let overrides = Overrides {
        bind_address: args.bind,
        port: args.port,
        upstream_host: args.upstream_host,
        log_level: args.log_level,
    };

    let config = resolve_config(args.config.as_deref(), &overrides)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("compat-shim v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url(),
        model_triggers = ?config.normalizer.model_triggers,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        // Validation has already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
