//! HTTP server setup and lifecycle management
//!
//! - TCP listener setup
//! - Spawns and stops the background reaper alongside the HTTP listener
//! - Graceful shutdown on SIGINT/SIGTERM

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::{reaper, routes, state::AppState};

/// The running server: owns nothing beyond what's needed to start and stop.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind, start serving, spawn the reaper, and block until a shutdown
    /// signal arrives. Both the HTTP listener and the reaper are stopped
    /// before this returns.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("failed to bind to {addr}"))?;
        let local_addr = listener.local_addr()?;
        info!("listening on http://{}", local_addr);

        let reaper_handle = reaper::spawn(
            self.state.core.clone(),
            self.state.config.clone(),
            self.state.clock.clone(),
            self.state.reaper_shutdown.clone(),
        );

        let app = routes::create_router(self.state.clone());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        self.state.reaper_shutdown.notify_one();
        let _ = reaper_handle.await;

        info!("server shutdown complete");
        Ok(())
    }
}

/// Waits for SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tcp_listener_binds_to_ephemeral_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await;
        assert!(listener.is_ok());
        assert!(listener.unwrap().local_addr().is_ok());
    }

    #[tokio::test]
    async fn server_holds_the_state_it_was_built_with() {
        let state = AppState::default();
        let server = Server::new(state.clone());
        assert_eq!(server.state.config.port, state.config.port);
    }
}
