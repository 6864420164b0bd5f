//! Call trace logging.
//!
//! Each traced call becomes a banner-delimited block appended to a plain text
//! file:
//!
//! ```text
//! -----Task ID: 7f0c...----
//! Step ID: search-1
//! Question: web_search
//! Answer: [ ... ]
//! Chat Completion Kwargs: {
//!     "query": "rust async"
//! }
//! Execution Time: 0.842 seconds
//! ------------------------
//! ```
//!
//! The payload line is produced by [`format::normalize`], which unwraps
//! escaped and nested JSON so the file stays readable.

pub mod entry;
pub mod format;
pub mod sink;

pub use entry::{LogEntry, SEPARATOR};
pub use format::{normalize, unescape, Payload};
pub use sink::{append_entry, FileLogSink, LogSink, MemoryLogSink};
