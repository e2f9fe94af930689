//! Filter predicate over log entries.
//!
//! The same `LogFilter` semantics apply to point-in-time queries against the
//! ring buffer and to live subscriptions on the broadcast hub: a compiled
//! filter matches on level membership and search text. The ID cursor and
//! result limit only have meaning for historical queries and are applied by
//! the ring buffer, not by the predicate itself.

use crate::models::LogEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A query/subscription predicate.
///
/// An all-default filter matches every entry.
///
/// # Example
///
/// ```
/// use shared::models::{LogEntry, LogFilter};
///
/// let filter = LogFilter {
///     search: "refused".to_string(),
///     ..LogFilter::default()
/// };
/// let matcher = filter.compile();
/// assert!(matcher.matches(&LogEntry::new("connection REFUSED")));
/// assert!(!matcher.matches(&LogEntry::new("connection accepted")));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogFilter {
    /// Substring (or, when `regex` is set, pattern) matched against the raw
    /// line text.
    pub search: String,

    /// Acceptable normalized levels; empty means no level restriction.
    pub levels: Vec<String>,

    /// Interpret `search` as a regular expression. A pattern that fails to
    /// compile silently degrades to case-insensitive substring search.
    pub regex: bool,

    /// Exclude entries with `id <= after_id`. Historical queries only.
    pub after_id: u64,

    /// Maximum entries returned; values `<= 0` select the default limit.
    /// Historical queries only.
    pub limit: i64,
}

impl LogFilter {
    /// Returns true when the filter restricts neither level nor search text.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.search.is_empty() && self.levels.is_empty()
    }

    /// Resolves the search pattern once, yielding a reusable matcher.
    ///
    /// Compiling here rather than per entry keeps the hub's fan-out loop and
    /// the buffer's query scan cheap. An invalid regex is not an error; the
    /// matcher falls back to case-insensitive substring search.
    #[must_use]
    pub fn compile(&self) -> CompiledFilter {
        let pattern = if self.regex && !self.search.is_empty() {
            Regex::new(&self.search).ok()
        } else {
            None
        };

        CompiledFilter {
            levels: self.levels.clone(),
            search_lower: self.search.to_lowercase(),
            pattern,
        }
    }
}

/// A [`LogFilter`] with its search pattern resolved.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    levels: Vec<String>,
    search_lower: String,
    pattern: Option<Regex>,
}

impl CompiledFilter {
    /// Evaluates the level and search predicates against one entry.
    ///
    /// Level membership is case-insensitive; an entry with no extracted
    /// level never matches a level-restricted filter.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.levels.is_empty() {
            let Some(level) = entry.level() else {
                return false;
            };
            if !self.levels.iter().any(|l| l.eq_ignore_ascii_case(level)) {
                return false;
            }
        }

        if !self.search_lower.is_empty() {
            if let Some(pattern) = &self.pattern {
                if !pattern.is_match(&entry.raw) {
                    return false;
                }
            } else if !entry.raw.to_lowercase().contains(&self.search_lower) {
                return false;
            }
        }

        true
    }
}
