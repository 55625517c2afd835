//! Distributed query router — coordination server entry point.
//!
//! Routes free-form text queries submitted by one worker node out to a pool
//! of others polling for work, and collects their responses for the
//! submitter to retrieve.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (0.0.0.0:8313)
//! cargo run
//!
//! # Start on a custom host and port
//! cargo run -- --host 127.0.0.1 --port 9090
//!
//! # Enable debug logging
//! RUST_LOG=debug cargo run
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: logging level (trace, debug, info, warn, error)
//! - `API_HOST` / `API_PORT`: bind address
//! - `ROUTER_MAX_QUERIES_PER_NODE`, `ROUTER_NODE_TIMEOUT_SECS`,
//!   `ROUTER_QUERY_TIMEOUT_SECS`, `ROUTER_MAX_RESPONSES_PER_QUERY`,
//!   `ROUTER_MAX_MEMORY_SIZE`, `ROUTER_SWEEP_INTERVAL_SECS`,
//!   `ROUTER_BATCH_CAP`: coordination policy knobs
//! - `ROUTER_JSON_LOGS`: emit structured JSON logs instead of human-readable

use anyhow::Result;
use clap::Parser;
use mesh_router::{config::Config, server::Server, state::AppState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_tracing(&config)?;

    info!("starting distributed query router");
    info!(version = env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config);

    info!("listening on http://{}:{}", state.config.host, state.config.port);
    info!("press Ctrl+C to shut down gracefully");

    Server::new(state).run().await
}

fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or_else(|_| {
            eprintln!("invalid log level '{}', using 'info'", config.log_level);
            tracing::Level::INFO
        });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("mesh_router={log_level},tower_http=info,axum=info").into()
    });

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    Ok(())
}
