//! # Tidelog Core
//!
//! Non-blocking log delivery for tidelog.
//!
//! [`AsyncWriter`] sits between log producers and any
//! [`LogSink`](tidelog_sink::LogSink). Producers never wait on the sink:
//! records go into a bounded queue, and when the queue is full they are
//! dropped and counted. The count is later written to the sink as a
//! `Too many logs, N logs lost` notice.
//!
//! ## Guarantees
//!
//! - Records that are delivered arrive in the order they were queued
//! - A write before close never blocks on the sink and never fails
//! - After [`AsyncWriter::close`] writes are synchronous and report errors
//!
//! ## Example
//!
//! ```rust,no_run
//! use tidelog_core::{open_file_log, Config, SharedWriter};
//!
//! let config = Config::default().max_file_len(1024 * 1024);
//! let log = SharedWriter::new(open_file_log("logs/app.log", &config).unwrap());
//!
//! tracing_subscriber::fmt()
//!     .with_writer(log.clone())
//!     .with_ansi(false)
//!     .init();
//!
//! tracing::info!("service started");
//! log.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod file_log;
mod loss;
mod shared;
mod writer;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use file_log::{open_file_log, FileLog};
pub use loss::LossState;
pub use shared::SharedWriter;
pub use writer::{AsyncWriter, DEFAULT_QUEUE_CAPACITY};
