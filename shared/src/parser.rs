//! Heuristic log line parsing.
//!
//! Turns a raw line into a [`LogEntry`] on a best-effort basis. Structured
//! (JSON object) lines get known fields extracted by synonym tables; plain
//! text lines go through keyword and timestamp pattern matching. Parsing
//! never fails: unparseable input degrades to a record whose message is the
//! raw line.

use crate::models::{LogEntry, ParsedLog};
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Key synonyms checked, in priority order, for each extracted field of a
/// structured line. The first present key wins and is consumed.
const LEVEL_KEYS: [&str; 4] = ["level", "lvl", "severity", "log.level"];
const MESSAGE_KEYS: [&str; 4] = ["msg", "message", "text", "log"];
const TIME_KEYS: [&str; 5] = ["time", "timestamp", "ts", "@timestamp", "datetime"];
const SOURCE_KEYS: [&str; 5] = ["logger", "source", "name", "caller", "component"];

/// Epoch values above this are taken as milliseconds, below as seconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Parses one raw line into a log entry.
///
/// The entry's `timestamp` is the ingestion instant; `raw` is the input
/// unmodified; `parsed` always carries a record, even for input where
/// nothing could be extracted.
///
/// # Example
///
/// ```
/// use shared::parser;
///
/// let entry = parser::parse(r#"{"level":"warn","msg":"low disk"}"#);
/// let parsed = entry.parsed.unwrap();
/// assert_eq!(parsed.level.as_deref(), Some("WARN"));
/// assert_eq!(parsed.message.as_deref(), Some("low disk"));
/// ```
#[must_use]
pub fn parse(line: &str) -> LogEntry {
    let parsed = parse_structured(line).unwrap_or_else(|| parse_text(line));
    LogEntry::new(line).with_parsed(parsed)
}

/// Attempts to decode the line as a JSON object and extract known fields.
///
/// Returns `None` when the line is not structured, which routes the line to
/// the text path; this is the expected outcome for most input, not an error.
fn parse_structured(line: &str) -> Option<ParsedLog> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }

    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(trimmed) else {
        return None;
    };
    let mut data: HashMap<String, Value> = object.into_iter().collect();

    let mut parsed = ParsedLog::default();

    // Only string level values are consumed; a numeric or otherwise odd
    // `level` key stays in the residual fields.
    for key in LEVEL_KEYS {
        if let Some(Value::String(s)) = data.get(key) {
            parsed.level = Some(normalize_level(s));
            data.remove(key);
            break;
        }
    }

    for key in MESSAGE_KEYS {
        if let Some(Value::String(s)) = data.get(key) {
            parsed.message = Some(s.clone());
            data.remove(key);
            break;
        }
    }

    // The first present time key is consumed even when its value cannot be
    // interpreted; a bad timestamp leaves `time` unset without touching the
    // other fields.
    for key in TIME_KEYS {
        if let Some(value) = data.get(key) {
            parsed.time = match value {
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
                Value::Number(n) => n.as_f64().and_then(parse_epoch),
                _ => None,
            };
            data.remove(key);
            break;
        }
    }

    for key in SOURCE_KEYS {
        if let Some(Value::String(s)) = data.get(key) {
            parsed.source = Some(s.clone());
            data.remove(key);
            break;
        }
    }

    parsed.fields = data;
    Some(parsed)
}

/// Interprets a numeric timestamp as Unix epoch seconds or milliseconds.
fn parse_epoch(value: f64) -> Option<DateTime<Utc>> {
    if value > EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value as i64).single()
    } else {
        Utc.timestamp_opt(value as i64, 0).single()
    }
}

/// Extracts level and timestamp from an unstructured line.
///
/// The message is the full raw line; matched level or timestamp substrings
/// are not stripped out of it.
fn parse_text(line: &str) -> ParsedLog {
    let mut parsed = ParsedLog {
        message: Some(line.to_string()),
        ..ParsedLog::default()
    };

    // When several level keywords appear, severity (not position) wins.
    let mut best_priority = 0;
    for candidate in level_patterns() {
        if candidate.pattern.is_match(line) && candidate.priority > best_priority {
            best_priority = candidate.priority;
            parsed.level = Some(candidate.level.to_string());
        }
    }

    // First pattern that matches anywhere in the line wins; the scan stops
    // there even when the matched text fails to parse.
    for sniffer in timestamp_patterns() {
        if let Some(found) = sniffer.pattern.find(line) {
            parsed.time = (sniffer.parse)(found.as_str());
            break;
        }
    }

    parsed
}

/// Normalizes a structured-input level string.
///
/// Case-folds and trims, then maps common abbreviations onto the fixed
/// vocabulary. Anything else passes through unchanged (upper-cased), so
/// unusual level vocabularies stay queryable by case-insensitive match.
fn normalize_level(level: &str) -> String {
    let level = level.trim().to_uppercase();
    match level.as_str() {
        "DBG" | "TRACE" => "DEBUG".to_string(),
        "INF" | "INFORMATION" => "INFO".to_string(),
        "WRN" | "WARNING" => "WARN".to_string(),
        "ERR" => "ERROR".to_string(),
        "CRIT" | "CRITICAL" | "PANIC" => "FATAL".to_string(),
        _ => level,
    }
}

/// A level keyword matcher for the text path.
struct LevelPattern {
    level: &'static str,
    priority: u8,
    pattern: Regex,
}

fn level_patterns() -> &'static [LevelPattern] {
    static PATTERNS: OnceLock<Vec<LevelPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Patterns are exercised by the unit tests below, so a bad pattern
        // fails the test suite rather than panicking in production.
        fn re(pattern: &str) -> Regex {
            Regex::new(pattern).expect("level_patterns: invalid regex")
        }

        vec![
            LevelPattern {
                level: "DEBUG",
                priority: 1,
                pattern: re(r"(?i)\b(DEBUG|DBG)\b"),
            },
            LevelPattern {
                level: "INFO",
                priority: 2,
                pattern: re(r"(?i)\b(INFO|INF)\b"),
            },
            LevelPattern {
                level: "WARN",
                priority: 3,
                pattern: re(r"(?i)\b(WARN|WARNING|WRN)\b"),
            },
            LevelPattern {
                level: "ERROR",
                priority: 4,
                pattern: re(r"(?i)\b(ERROR|ERR)\b"),
            },
            LevelPattern {
                level: "FATAL",
                priority: 5,
                pattern: re(r"(?i)\b(FATAL|CRITICAL|CRIT|PANIC)\b"),
            },
        ]
    })
}

/// A timestamp sniffer: a regex locating a candidate substring plus the
/// parser converting that substring to an instant.
struct TimestampPattern {
    pattern: Regex,
    parse: fn(&str) -> Option<DateTime<Utc>>,
}

fn timestamp_patterns() -> &'static [TimestampPattern] {
    static PATTERNS: OnceLock<Vec<TimestampPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        fn re(pattern: &str) -> Regex {
            Regex::new(pattern).expect("timestamp_patterns: invalid regex")
        }

        vec![
            // ISO 8601 / RFC 3339, offset optional in the match but required
            // for a successful parse.
            TimestampPattern {
                pattern: re(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?"),
                parse: |s| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|t| t.with_timezone(&Utc))
                },
            },
            // Space-separated date and time, optional fractional seconds.
            TimestampPattern {
                pattern: re(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d+)?"),
                parse: |s| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                        .ok()
                        .map(|t| t.and_utc())
                },
            },
            // Combined log format, e.g. 15/Jan/2024:10:30:00.
            TimestampPattern {
                pattern: re(r"\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}"),
                parse: |s| {
                    NaiveDateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S")
                        .ok()
                        .map(|t| t.and_utc())
                },
            },
            // Syslog style, e.g. "Jan  2 15:04:05". The format carries no
            // year, so the current one is supplied.
            TimestampPattern {
                pattern: re(r"\w{3} +\d{1,2} \d{2}:\d{2}:\d{2}"),
                parse: |s| {
                    let with_year = format!("{} {s}", Utc::now().year());
                    NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S")
                        .ok()
                        .map(|t| t.and_utc())
                },
            },
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_line_with_abbreviated_level_and_epoch_seconds() {
        let entry = parse(r#"{"level":"err","msg":"disk full","ts":1700000000}"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(parsed.level.as_deref(), Some("ERROR"));
        assert_eq!(parsed.message.as_deref(), Some("disk full"));
        assert_eq!(
            parsed.time,
            Utc.timestamp_opt(1_700_000_000, 0).single()
        );
        assert!(parsed.fields.is_empty());
    }

    #[test]
    fn test_structured_line_epoch_milliseconds() {
        let entry = parse(r#"{"msg":"tick","time":1700000000123}"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(
            parsed.time,
            Utc.timestamp_millis_opt(1_700_000_000_123).single()
        );
    }

    #[test]
    fn test_structured_line_iso_time_string() {
        let entry = parse(r#"{"msg":"boot","timestamp":"2024-01-15T10:30:00Z"}"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(
            parsed.time,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_structured_line_bad_time_consumed_but_unset() {
        let entry = parse(r#"{"msg":"x","time":"not a timestamp"}"#);
        let parsed = entry.parsed.unwrap();

        assert!(parsed.time.is_none());
        // The key was still consumed, so it does not appear in fields.
        assert!(parsed.fields.is_empty());
    }

    #[test]
    fn test_structured_line_retains_unconsumed_fields() {
        let entry = parse(r#"{"level":"info","msg":"hi","request_id":"r-1","attempt":2}"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.fields.get("request_id"), Some(&json!("r-1")));
        assert_eq!(parsed.fields.get("attempt"), Some(&json!(2)));
    }

    #[test]
    fn test_structured_key_priority_order() {
        // "msg" outranks "message"; the loser stays in fields.
        let entry = parse(r#"{"msg":"first","message":"second"}"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(parsed.message.as_deref(), Some("first"));
        assert_eq!(parsed.fields.get("message"), Some(&json!("second")));
    }

    #[test]
    fn test_structured_non_string_level_not_consumed() {
        let entry = parse(r#"{"level":30,"severity":"warn","msg":"x"}"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(parsed.level.as_deref(), Some("WARN"));
        assert_eq!(parsed.fields.get("level"), Some(&json!(30)));
    }

    #[test]
    fn test_structured_source_synonyms() {
        let entry = parse(r#"{"msg":"x","logger":"auth"}"#);
        assert_eq!(
            entry.parsed.unwrap().source.as_deref(),
            Some("auth")
        );

        let entry = parse(r#"{"msg":"x","component":"db"}"#);
        assert_eq!(entry.parsed.unwrap().source.as_deref(), Some("db"));
    }

    #[test]
    fn test_structured_trace_normalizes_to_debug() {
        let entry = parse(r#"{"level":"trace","msg":"x"}"#);
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_structured_unknown_level_passes_through() {
        let entry = parse(r#"{"level":"notice","msg":"x"}"#);
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("NOTICE"));
    }

    #[test]
    fn test_invalid_json_falls_through_to_text_path() {
        let entry = parse("{not valid json, but has ERROR in it");
        let parsed = entry.parsed.unwrap();

        assert_eq!(parsed.level.as_deref(), Some("ERROR"));
        assert_eq!(
            parsed.message.as_deref(),
            Some("{not valid json, but has ERROR in it")
        );
    }

    #[test]
    fn test_json_array_falls_through_to_text_path() {
        // Trimmed line must start with a brace; arrays are not structured
        // records here.
        let entry = parse(r#"["a","b"]"#);
        let parsed = entry.parsed.unwrap();
        assert_eq!(parsed.message.as_deref(), Some(r#"["a","b"]"#));
        assert!(parsed.fields.is_empty());
    }

    #[test]
    fn test_text_line_with_iso_timestamp_and_level() {
        let entry = parse("2024-01-15T10:30:00Z ERROR connection refused");
        let parsed = entry.parsed.unwrap();

        assert_eq!(parsed.level.as_deref(), Some("ERROR"));
        assert_eq!(
            parsed.time,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        // The message is the full raw line, matched substrings included.
        assert_eq!(
            parsed.message.as_deref(),
            Some("2024-01-15T10:30:00Z ERROR connection refused")
        );
    }

    #[test]
    fn test_text_line_without_metadata() {
        let entry = parse("just some text");
        let parsed = entry.parsed.unwrap();

        assert!(parsed.level.is_none());
        assert!(parsed.time.is_none());
        assert_eq!(parsed.message.as_deref(), Some("just some text"));
    }

    #[test]
    fn test_text_level_most_severe_wins() {
        let entry = parse("INFO request failed with ERROR code 500");
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("ERROR"));

        let entry = parse("ERROR while logging a DEBUG message");
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("ERROR"));
    }

    #[test]
    fn test_text_level_keywords_are_word_bounded() {
        // "infodump" must not match INFO.
        let entry = parse("reading infodump from cache");
        assert!(entry.parsed.unwrap().level.is_none());
    }

    #[test]
    fn test_text_level_abbreviations() {
        let entry = parse("WRN cache nearly full");
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("WARN"));

        let entry = parse("kernel: PANIC at address 0xdead");
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("FATAL"));
    }

    #[test]
    fn test_text_space_separated_timestamp() {
        let entry = parse("2024-03-01 08:15:30.250 INFO started");
        let parsed = entry.parsed.unwrap();

        let expected = Utc
            .with_ymd_and_hms(2024, 3, 1, 8, 15, 30)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(250))
            .unwrap();
        assert_eq!(parsed.time, Some(expected));
    }

    #[test]
    fn test_text_combined_log_format_timestamp() {
        let entry = parse(r#"127.0.0.1 - - [15/Jan/2024:10:30:00 +0000] "GET / HTTP/1.1" 200"#);
        let parsed = entry.parsed.unwrap();

        assert_eq!(
            parsed.time,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_text_syslog_timestamp_gets_current_year() {
        let entry = parse("Jan  2 15:04:05 myhost sshd[123]: accepted");
        let parsed = entry.parsed.unwrap();

        let time = parsed.time.expect("syslog timestamp should parse");
        assert_eq!(time.year(), Utc::now().year());
        assert_eq!(time.month(), 1);
        assert_eq!(time.day(), 2);
    }

    #[test]
    fn test_text_first_matching_timestamp_pattern_wins() {
        // Both an ISO timestamp and a syslog-looking fragment are present;
        // the ISO pattern is tried first.
        let entry = parse("2024-06-01T00:00:00Z also mentions Jan  2 15:04:05");
        let parsed = entry.parsed.unwrap();

        assert_eq!(
            parsed.time,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_text_iso_timestamp_without_offset_leaves_time_unset() {
        // The pattern matches, stopping the scan, but RFC 3339 parsing
        // requires an offset.
        let entry = parse("2024-01-15T10:30:00 ERROR no offset");
        let parsed = entry.parsed.unwrap();

        assert!(parsed.time.is_none());
        assert_eq!(parsed.level.as_deref(), Some("ERROR"));
    }

    #[test]
    fn test_empty_line() {
        let entry = parse("");
        let parsed = entry.parsed.unwrap();

        assert_eq!(entry.raw, "");
        assert!(parsed.level.is_none());
        assert!(parsed.time.is_none());
        assert_eq!(parsed.message.as_deref(), Some(""));
    }

    #[test]
    fn test_raw_is_preserved_verbatim() {
        let line = r#"  {"level":"info","msg":"padded"}  "#;
        let entry = parse(line);

        assert_eq!(entry.raw, line);
        // Parsing still succeeds on the trimmed content.
        assert_eq!(entry.parsed.unwrap().level.as_deref(), Some("INFO"));
    }

    #[test]
    fn test_normalize_level_table() {
        assert_eq!(normalize_level("dbg"), "DEBUG");
        assert_eq!(normalize_level("trace"), "DEBUG");
        assert_eq!(normalize_level("inf"), "INFO");
        assert_eq!(normalize_level("information"), "INFO");
        assert_eq!(normalize_level("wrn"), "WARN");
        assert_eq!(normalize_level("warning"), "WARN");
        assert_eq!(normalize_level("err"), "ERROR");
        assert_eq!(normalize_level("crit"), "FATAL");
        assert_eq!(normalize_level("critical"), "FATAL");
        assert_eq!(normalize_level("panic"), "FATAL");
        assert_eq!(normalize_level(" Error "), "ERROR");
        assert_eq!(normalize_level("custom"), "CUSTOM");
    }
}
