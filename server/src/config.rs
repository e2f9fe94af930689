//! Server configuration module.

use std::net::SocketAddr;

/// Server configuration, assembled from CLI flags and their environment
/// fallbacks by the binary entry point.
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Maximum number of log lines retained in the ring buffer.
    pub buffer_capacity: usize,
    /// Whether to auto-open the browser on startup.
    pub open_browser: bool,
}

impl Config {
    /// Returns the socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the host and port combination cannot be parsed as a valid
    /// socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address from config")
    }

    /// The URL the server is reachable at locally.
    #[must_use]
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            buffer_capacity: 10_000,
            open_browser: true,
        }
    }
}
