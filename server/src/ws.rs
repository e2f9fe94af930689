//! Live log feed over WebSocket.
//!
//! Each connection gets one hub subscriber. The read half applies client
//! commands (subscribe/unsubscribe/ping) to that subscriber; the write half
//! drains the subscriber's delivery queue into the socket and keeps the
//! connection alive with periodic pings. Whichever half fails first tears
//! the connection down; unregistration is idempotent on the hub side, so
//! the teardown race is harmless.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use shared::hub::{Event, Subscriber};
use shared::models::{LogEntry, LogFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Interval between protocol-level keep-alive pings.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Server → client messages.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum ServerMessage {
    /// A log entry matching the subscriber's filter.
    Log(LogEntry),
    /// Upstream liveness change.
    Status {
        #[serde(rename = "stdinOpen")]
        stdin_open: bool,
    },
    /// Acknowledgment of a client ping.
    Pong,
}

impl From<Event> for ServerMessage {
    fn from(event: Event) -> Self {
        match event {
            Event::Log(entry) => Self::Log(entry),
            Event::Status { stdin_open } => Self::Status { stdin_open },
            Event::Pong => Self::Pong,
        }
    }
}

/// Client → server messages.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
    /// Replace the subscription filter.
    Subscribe {
        #[serde(default)]
        filter: LogFilter,
    },
    /// Reset the filter to match-all.
    Unsubscribe,
    /// Application-level keep-alive; elicits a `pong`, bypassing filters.
    Ping,
}

/// Creates the WebSocket routes with application state.
pub fn ws_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws/logs", get(ws_upgrade))
        .with_state(state)
}

/// Handler for the WebSocket upgrade request.
async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Drives one live connection from registration to teardown.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let (subscriber, events) = state.hub().subscribe();
    let id = subscriber.id();
    debug!(id, "websocket connected");

    let (sender, receiver) = socket.split();

    let mut write_task = tokio::spawn(write_pump(sender, events));
    let mut read_task = tokio::spawn(read_pump(receiver, Arc::clone(&subscriber)));

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    state.hub().unsubscribe(id);
    debug!(id, "websocket disconnected");
}

/// Forwards queued events to the socket and sends keep-alive pings.
async fn write_pump(
    mut sender: SplitSink<WebSocket, Message>,
    mut events: mpsc::Receiver<Event>,
) {
    let mut ping = tokio::time::interval(PING_INTERVAL);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                match serde_json::to_string(&ServerMessage::from(event)) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to serialize event");
                    }
                }
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Applies inbound client commands to the connection's subscriber.
///
/// Malformed messages are ignored; a misbehaving client only hurts itself.
async fn read_pump(mut receiver: SplitStream<WebSocket>, subscriber: Arc<Subscriber>) {
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Subscribe { filter }) => subscriber.set_filter(&filter),
                Ok(ClientMessage::Unsubscribe) => subscriber.clear_filter(),
                Ok(ClientMessage::Ping) => {
                    // The pong travels the same bounded queue as any other
                    // event, drop-on-full included.
                    subscriber.try_send(Event::Pong);
                }
                Err(_) => {}
            },
            Ok(Message::Close(_)) => break,
            // Protocol ping/pong is handled by axum; binary frames carry no
            // commands.
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "websocket receive error");
                break;
            }
        }
    }
}
