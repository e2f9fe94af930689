//! Standard-input ingestion loop.
//!
//! The single producer of the system: reads one line at a time, parses it,
//! stores it in the ring buffer, and hands the stored entry to the hub. The
//! loop only ever blocks on the upstream read; retention and broadcast are
//! non-blocking by construction.

use crate::state::AppState;
use shared::parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Reads stdin to exhaustion, then flags the upstream as closed.
///
/// The server keeps running after EOF so the retained history stays
/// queryable.
pub async fn read_stdin(state: AppState) {
    let reader = BufReader::new(tokio::io::stdin());
    ingest_lines(reader, &state).await;

    state.hub().notify_upstream_closed();
    tracing::info!("stdin closed");
}

/// Feeds each line of `reader` through the parse → retain → broadcast
/// pipeline. Returns when the reader is exhausted or fails.
pub async fn ingest_lines<R>(reader: R, state: &AppState)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let entry = parser::parse(&line);
                match state.buffer().add(entry) {
                    Ok(stored) => state.hub().broadcast(stored),
                    Err(e) => tracing::error!(error = %e, "failed to retain log line"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read error");
                break;
            }
        }
    }
}
