//! The standard composition: an async writer over a rotating file.

use crate::config::Config;
use crate::error::CoreResult;
use crate::writer::AsyncWriter;
use std::path::Path;
use tidelog_sink::RotatingFileWriter;
use tracing::info;

/// Async, drop-on-overflow writer in front of a rotating log file.
pub type FileLog = AsyncWriter<RotatingFileWriter>;

/// Opens a rotating log file at `path` behind an async writer.
///
/// The parent directory is created if needed, and archives a previous run
/// left uncompressed are compressed in the background.
///
/// # Errors
///
/// Returns an error if `config` is invalid, the file cannot be opened, or
/// the drain thread cannot be started.
///
/// # Example
///
/// ```no_run
/// use tidelog_core::{open_file_log, Config};
///
/// let log = open_file_log("logs/app.log", &Config::default()).unwrap();
/// log.write(b"service started\n").unwrap();
/// log.close().unwrap();
/// ```
pub fn open_file_log(path: impl AsRef<Path>, config: &Config) -> CoreResult<FileLog> {
    config.validate()?;
    let path = path.as_ref();

    let file = RotatingFileWriter::open(path, config.max_file_len, config.max_archived_files)?;
    let log = AsyncWriter::with_capacity(file, config.queue_capacity)?;

    info!(
        path = %path.display(),
        max_file_len = config.max_file_len,
        max_archived_files = config.max_archived_files,
        "writing log to file"
    );
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("svc.log");

        let log = open_file_log(&path, &Config::default()).unwrap();
        log.write(b"line one\n").unwrap();
        log.write(b"line two\n").unwrap();
        log.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"line one\nline two\n");
    }

    #[test]
    fn invalid_config_opens_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");

        let result = open_file_log(&path, &Config::new().max_file_len(0));
        assert!(matches!(result, Err(CoreError::Configuration { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn writes_after_close_are_synchronous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svc.log");

        let log = open_file_log(&path, &Config::default()).unwrap();
        log.close().unwrap();
        log.write(b"late\n").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"late\n");
    }
}
