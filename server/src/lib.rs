//! Logtap Server
//!
//! This crate provides the HTTP/WebSocket server for logtap, a local
//! log-tailing and inspection tool. Raw lines arrive on stdin, pass through
//! the core engine in the `shared` crate, and come back out as a filtered
//! history query (`/api/logs`) or a live per-subscriber feed (`/ws/logs`).
//!
//! # Architecture
//!
//! The server is built on Axum and Tokio:
//! - REST API for querying, clearing, and inspecting the retained history
//! - WebSocket endpoint for filtered live tailing
//! - A single ingestion task feeding the ring buffer and broadcast hub
//!
//! # Example
//!
//! ```no_run
//! use server::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let (state, hub_runner) = AppState::new(&config);
//!     tokio::spawn(hub_runner.run());
//!     tokio::spawn(server::ingest::read_stdin(state.clone()));
//!     server::run_server(config, state).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
pub mod ingest;
mod routes;
mod state;
mod ws;

pub use config::Config;
pub use state::AppState;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Runs the logtap server until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if:
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server(config: Config, state: AppState) -> Result<()> {
    let addr = config.socket_addr();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "logtap server starting"
    );

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a
/// full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::logs_routes(state.clone()))
        .merge(routes::status_routes(state.clone()))
        .merge(ws::ws_routes(state))
        .merge(routes::ui_routes())
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
