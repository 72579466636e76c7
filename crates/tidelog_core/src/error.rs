//! Error types for tidelog core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in tidelog core operations.
///
/// Dropped writes and background failures are never reported through this
/// type; they show up in the loss counter or on the diagnostic channel.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sink error.
    #[error("sink error: {0}")]
    Sink(#[from] tidelog_sink::SinkError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the invalid value.
        message: String,
    },

    /// The drain thread panicked while writing to the sink.
    #[error("drain thread panicked")]
    DrainPanicked,
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
