//! Logtap Core Library
//!
//! This crate contains the streaming retention-and-fan-out engine behind the
//! logtap log-tailing tool:
//!
//! - [`models`] - Log entry and filter data models
//! - [`buffer`] - Bounded ring buffer with monotonic IDs and filtered queries
//! - [`parser`] - Heuristic extraction of structure from raw log lines
//! - [`hub`] - Publish/subscribe fan-out to live, individually filtered
//!   subscribers
//!
//! # Example
//!
//! ```
//! use shared::buffer::RingBuffer;
//! use shared::parser;
//!
//! let buffer = RingBuffer::new(1000);
//! let stored = buffer.add(parser::parse("ERROR disk full")).unwrap();
//!
//! assert_eq!(stored.id, 1);
//! assert_eq!(stored.level(), Some("ERROR"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod buffer;
pub mod hub;
pub mod models;
pub mod parser;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
