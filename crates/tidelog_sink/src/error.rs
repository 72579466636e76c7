//! Error types for sink operations.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// The rotation step that failed.
///
/// Rotation is close, rename, reopen. Any of the three failing aborts the
/// triggering write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStep {
    /// Syncing and closing the active file handle.
    Close,
    /// Renaming the active file to its archive name.
    Rename,
    /// Opening a fresh file at the active path.
    Reopen,
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::Close => "close",
            Self::Rename => "rename",
            Self::Reopen => "reopen",
        };
        f.write_str(step)
    }
}

/// Errors that can occur while writing to a sink or managing log files.
#[derive(Debug, Error)]
pub enum SinkError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to create the directory holding the log file.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDirectory {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A synchronous rotation step failed.
    #[error("failed to rotate log file {} ({step}): {source}", path.display())]
    Rotation {
        /// Which rotation step failed.
        step: RotationStep,
        /// The file being rotated.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Compressing an archive failed.
    #[error("failed to compress archive {}: {source}", path.display())]
    Compression {
        /// The archive being compressed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Removing or listing archives during retention pruning failed.
    #[error("failed to prune archive {}: {source}", path.display())]
    Prune {
        /// The archive (or directory) involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Invalid sink configuration.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the invalid value.
        message: String,
    },

    /// The sink is closed.
    #[error("sink is closed")]
    Closed,
}

impl SinkError {
    /// Creates a rotation error for the given step.
    pub fn rotation(step: RotationStep, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Rotation {
            step,
            path: path.into(),
            source,
        }
    }

    /// Creates a compression error.
    pub fn compression(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Compression {
            path: path.into(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a pruning error.
    pub fn prune(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Prune {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_error_names_step_and_path() {
        let err = SinkError::rotation(
            RotationStep::Rename,
            "/var/log/app.log",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("rename"));
        assert!(message.contains("/var/log/app.log"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn configuration_error_display() {
        let err = SinkError::configuration("max file length must be at least 1 byte");
        assert_eq!(
            err.to_string(),
            "invalid configuration: max file length must be at least 1 byte"
        );
    }

    #[test]
    fn io_error_converts() {
        let err: SinkError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
