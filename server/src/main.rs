//! Logtap Server Binary
//!
//! Entry point for the logtap log-tailing tool:
//!
//! ```bash
//! some-command 2>&1 | logtap --port 8080
//! ```

#![deny(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use server::{ingest, AppState, Config};

/// Pipe logs in, inspect and live-tail them in the browser.
#[derive(Parser)]
#[command(name = "logtap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LOGTAP_HOST", default_value = "127.0.0.1")]
    host: String,

    /// HTTP server port
    #[arg(short, long, env = "LOGTAP_PORT", default_value_t = 8080)]
    port: u16,

    /// Maximum number of log lines to retain
    #[arg(long = "buffer", env = "LOGTAP_BUFFER", default_value_t = 10_000)]
    buffer: usize,

    /// Don't auto-open the browser
    #[arg(long)]
    no_open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdin is the data plane.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.buffer > 0, "--buffer must be positive");

    let config = Config {
        host: cli.host,
        port: cli.port,
        buffer_capacity: cli.buffer,
        open_browser: !cli.no_open,
    };

    let (state, hub_runner) = AppState::new(&config);
    tokio::spawn(hub_runner.run());
    tokio::spawn(ingest::read_stdin(state.clone()));

    if config.open_browser {
        open_browser(&config.local_url());
    }

    server::run_server(config, state).await
}

/// Opens `url` in the platform browser. Failure is only a warning; the
/// server works fine without it.
fn open_browser(url: &str) {
    let spawned = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };

    if let Err(e) = spawned {
        tracing::warn!(error = %e, url, "failed to open browser");
    }
}
