//! Bounded in-memory log retention.
//!
//! Provides the `RingBuffer`, a fixed-capacity overwrite-oldest store of
//! [`LogEntry`] values that also owns monotonic ID assignment. The buffer is
//! written by the single ingestion path and read concurrently by query
//! handlers, so all state sits behind an `RwLock`.

use crate::models::{LogEntry, LogFilter};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use thiserror::Error;

/// Cap applied to query results when the caller supplies no usable limit.
const DEFAULT_QUERY_LIMIT: usize = 1000;

/// Errors that can occur during ring buffer operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Failed to acquire the lock guarding the buffer state.
    #[error("failed to acquire lock on ring buffer")]
    LockPoisoned,
}

/// Read-only snapshot of buffer occupancy and lifetime insertion count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferStats {
    /// Fixed capacity chosen at construction.
    pub capacity: usize,
    /// Entries currently held.
    pub used: usize,
    /// Lifetime insertion count; also the highest ID issued so far.
    pub total_received: u64,
}

/// Result of a filtered query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Matching entries in chronological (insertion) order.
    pub logs: Vec<LogEntry>,
    /// Count of entries matching all filters, before truncation.
    pub total: usize,
    /// True iff the result was truncated by the limit.
    pub has_more: bool,
}

/// Fixed-capacity, overwrite-oldest store of log entries.
///
/// IDs are assigned at insertion, start at 1, and are never reused; a
/// [`RingBuffer::clear`] empties the visible contents but leaves the ID
/// sequence untouched.
///
/// # Example
///
/// ```
/// use shared::buffer::RingBuffer;
/// use shared::models::LogEntry;
///
/// let buffer = RingBuffer::new(100);
/// let stored = buffer.add(LogEntry::new("hello")).unwrap();
/// assert_eq!(stored.id, 1);
/// assert_eq!(buffer.snapshot().unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct RingBuffer {
    capacity: usize,
    inner: RwLock<RingState>,
}

#[derive(Debug)]
struct RingState {
    /// Stored entries; grows up to `capacity`, then wraps via `head`.
    entries: Vec<LogEntry>,
    /// Next write position once the buffer is full.
    head: usize,
    /// Lifetime insertion count, the monotonic ID source.
    total_received: u64,
}

impl RingBuffer {
    /// Creates a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be nonzero");
        Self {
            capacity,
            inner: RwLock::new(RingState {
                entries: Vec::with_capacity(capacity),
                head: 0,
                total_received: 0,
            }),
        }
    }

    /// Inserts an entry, assigning it the next monotonic ID.
    ///
    /// If the buffer is already at capacity the oldest entry is overwritten
    /// in place. Returns the stored, ID-bearing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock guarding the buffer is poisoned.
    pub fn add(&self, mut entry: LogEntry) -> Result<LogEntry, BufferError> {
        let mut state = self.inner.write().map_err(|_| BufferError::LockPoisoned)?;

        state.total_received += 1;
        entry.id = state.total_received;

        if state.entries.len() < self.capacity {
            state.entries.push(entry.clone());
        } else {
            let head = state.head;
            state.entries[head] = entry.clone();
        }
        state.head = (state.head + 1) % self.capacity;

        Ok(entry)
    }

    /// Returns all held entries in chronological order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock guarding the buffer is poisoned.
    pub fn snapshot(&self) -> Result<Vec<LogEntry>, BufferError> {
        let state = self.inner.read().map_err(|_| BufferError::LockPoisoned)?;

        // Before the first wrap (and exactly at a wrap boundary) insertion
        // order is index order; otherwise the oldest entry sits at `head`.
        if state.entries.len() < self.capacity || state.head == 0 {
            return Ok(state.entries.clone());
        }

        let mut result = Vec::with_capacity(state.entries.len());
        result.extend_from_slice(&state.entries[state.head..]);
        result.extend_from_slice(&state.entries[..state.head]);
        Ok(result)
    }

    /// Applies a filter to the current contents.
    ///
    /// Filters apply in order: ID cursor, level membership, then search
    /// text. `total` counts all matches before truncation; `has_more` is
    /// true iff the limit truncated the result. A limit `<= 0` selects the
    /// default of 1000.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock guarding the buffer is poisoned.
    pub fn query(&self, filter: &LogFilter) -> Result<QueryResult, BufferError> {
        let matcher = filter.compile();

        let mut logs: Vec<LogEntry> = self
            .snapshot()?
            .into_iter()
            .filter(|entry| entry.id > filter.after_id && matcher.matches(entry))
            .collect();

        let total = logs.len();
        let limit = if filter.limit <= 0 {
            DEFAULT_QUERY_LIMIT
        } else {
            usize::try_from(filter.limit).unwrap_or(DEFAULT_QUERY_LIMIT)
        };

        let has_more = total > limit;
        if has_more {
            logs.truncate(limit);
        }

        Ok(QueryResult {
            logs,
            total,
            has_more,
        })
    }

    /// Empties the visible contents.
    ///
    /// ID generation state is untouched: the next insertion continues the
    /// existing sequence with a gap rather than a collision.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock guarding the buffer is poisoned.
    pub fn clear(&self) -> Result<(), BufferError> {
        let mut state = self.inner.write().map_err(|_| BufferError::LockPoisoned)?;
        state.entries.clear();
        state.head = 0;
        Ok(())
    }

    /// Returns occupancy and lifetime insertion statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock guarding the buffer is poisoned.
    pub fn stats(&self) -> Result<BufferStats, BufferError> {
        let state = self.inner.read().map_err(|_| BufferError::LockPoisoned)?;
        Ok(BufferStats {
            capacity: self.capacity,
            used: state.entries.len(),
            total_received: state.total_received,
        })
    }
}
