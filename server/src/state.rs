//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::config::Config;
use chrono::{DateTime, Utc};
use shared::buffer::RingBuffer;
use shared::hub::{Hub, HubRunner};
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// Holds the ring buffer, the broadcast hub, and the server start time used
/// for uptime reporting.
#[derive(Clone)]
pub struct AppState {
    buffer: Arc<RingBuffer>,
    hub: Arc<Hub>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the application state together with the hub actor.
    ///
    /// The returned [`HubRunner`] must be spawned for live delivery to
    /// work; everything else (queries, stats, clears) functions without it.
    #[must_use]
    pub fn new(config: &Config) -> (Self, HubRunner) {
        let (hub, runner) = Hub::new();
        let state = Self {
            buffer: Arc::new(RingBuffer::new(config.buffer_capacity)),
            hub: Arc::new(hub),
            started_at: Utc::now(),
        };
        (state, runner)
    }

    /// Returns the ring buffer.
    #[must_use]
    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    /// Returns the broadcast hub.
    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Seconds elapsed since the server started.
    #[must_use]
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
