//! Writer configuration.

use crate::error::{CoreError, CoreResult};
use crate::writer::DEFAULT_QUEUE_CAPACITY;
use tidelog_sink::{DEFAULT_MAX_ARCHIVED_FILES, DEFAULT_MAX_FILE_LEN};

/// Configuration for opening a file log.
///
/// Supplied once at construction; nothing is reloaded at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Records the async queue holds before new writes are dropped.
    pub queue_capacity: usize,

    /// Size of the active file, in bytes, that triggers rotation.
    pub max_file_len: u64,

    /// Compressed archives kept; older ones are deleted.
    pub max_archived_files: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_file_len: DEFAULT_MAX_FILE_LEN, // 10 MiB
            max_archived_files: DEFAULT_MAX_ARCHIVED_FILES,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the async queue capacity.
    #[must_use]
    pub const fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the rotation threshold.
    #[must_use]
    pub const fn max_file_len(mut self, len: u64) -> Self {
        self.max_file_len = len;
        self
    }

    /// Sets how many compressed archives are kept.
    #[must_use]
    pub const fn max_archived_files(mut self, count: usize) -> Self {
        self.max_archived_files = count;
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the queue capacity or the
    /// rotation threshold is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.queue_capacity == 0 {
            return Err(CoreError::configuration(
                "queue capacity must be at least 1",
            ));
        }
        if self.max_file_len == 0 {
            return Err(CoreError::configuration(
                "max file length must be at least 1 byte",
            ));
        }
        Ok(())
    }
}
