//! # Tidelog Testkit
//!
//! Test utilities for tidelog.
//!
//! This crate provides:
//! - Sink doubles that stall or fail on demand
//! - Temporary log directories with archive helpers
//! - Property-based record generators using proptest
//! - Polling helpers for background threads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tidelog_testkit::prelude::*;
//!
//! #[test]
//! fn queue_fills_behind_stalled_sink() {
//!     let gate = Gate::closed();
//!     let sink = GatedSink::new(MemorySink::new(), gate.clone());
//!     // ... write until the queue is full, then gate.open()
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod fixtures;
pub mod generators;
pub mod wait;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::wait::*;
}

pub use doubles::*;
pub use fixtures::*;
pub use generators::*;
pub use wait::*;
