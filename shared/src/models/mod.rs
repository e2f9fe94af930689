//! Data models shared by the ring buffer, parser, and broadcast hub.

pub mod entry;
pub mod filter;

pub use entry::{LogEntry, ParsedLog};
pub use filter::{CompiledFilter, LogFilter};
