//! # Tidelog Sink
//!
//! Byte sinks and the rotating log file writer for tidelog.
//!
//! This crate provides the lowest layer of tidelog. Sinks are **opaque byte
//! consumers** - they do not format, filter or frame log records.
//!
//! ## Design Principles
//!
//! - A sink accepts a whole record or returns an error
//! - Synchronous errors are the only failure signal a sink gives
//! - Background work (compression, pruning) never fails a write
//! - Time and task spawning are injectable for deterministic tests
//!
//! ## Available Sinks
//!
//! - [`MemorySink`] - For testing
//! - [`IoSink`] - Adapter for any `std::io::Write`
//! - [`RotatingFileWriter`] - Size-bounded, self-rotating, self-compressing file
//!
//! ## Example
//!
//! ```rust
//! use tidelog_sink::{LogSink, MemorySink};
//!
//! let probe = MemorySink::new();
//! let mut sink = probe.clone();
//! sink.write(b"hello world").unwrap();
//! assert_eq!(probe.data(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
mod clock;
mod error;
mod file;
mod memory;
mod sink;
mod task;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{RotationStep, SinkError, SinkResult};
pub use file::{
    RotatingFileWriter, RotatingFileWriterBuilder, DEFAULT_MAX_ARCHIVED_FILES,
    DEFAULT_MAX_FILE_LEN,
};
pub use memory::MemorySink;
pub use sink::{IoSink, LogSink};
pub use task::{InlineSpawner, Spawner, Task, ThreadSpawner};
