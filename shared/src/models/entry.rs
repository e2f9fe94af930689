//! Log entry data model.
//!
//! Defines the core `LogEntry` structure produced by the parser and retained
//! by the ring buffer, together with its `ParsedLog` metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single ingested log line.
///
/// Entries are created once by the ingestion path and are immutable
/// afterwards; they disappear only when evicted by the ring buffer or when
/// the buffer is cleared.
///
/// # Example
///
/// ```
/// use shared::models::LogEntry;
///
/// let entry = LogEntry::new("ERROR connection refused");
/// assert_eq!(entry.id, 0); // assigned by the ring buffer at insertion
/// assert_eq!(entry.raw, "ERROR connection refused");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic identifier, assigned at insertion time. Strictly increasing
    /// for the lifetime of the process and never reused, even after eviction
    /// or a buffer clear. Zero until the ring buffer assigns it.
    pub id: u64,

    /// Wall-clock time of ingestion (not the time parsed from the line).
    pub timestamp: DateTime<Utc>,

    /// The original line text, unmodified.
    pub raw: String,

    /// Best-effort structured extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedLog>,
}

impl LogEntry {
    /// Creates a new unparsed entry with the current ingestion timestamp.
    ///
    /// The `id` is zero until the entry is inserted into a ring buffer.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            raw: raw.into(),
            parsed: None,
        }
    }

    /// Attaches parsed metadata to the entry.
    #[must_use]
    pub fn with_parsed(mut self, parsed: ParsedLog) -> Self {
        self.parsed = Some(parsed);
        self
    }

    /// Returns the normalized severity of the entry, if one was extracted.
    #[must_use]
    pub fn level(&self) -> Option<&str> {
        self.parsed.as_ref().and_then(|p| p.level.as_deref())
    }
}

/// Structured fields extracted from a log line on a best-effort basis.
///
/// All fields are optional; `fields` holds whatever keys of a structured
/// line were not consumed by the known-synonym extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedLog {
    /// Timestamp extracted from the line's own content (distinct from the
    /// ingestion timestamp on [`LogEntry`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    /// Normalized severity. When present this is the output of one of the
    /// parser's normalization tables, never a raw level string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Best-effort human-readable message body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Logger or component name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Remaining unrecognized keys of a structured line, kept verbatim.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,
}
