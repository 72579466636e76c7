//! Size-bounded, self-rotating log file writer.

use crate::archive;
use crate::clock::{Clock, SystemClock};
use crate::error::{RotationStep, SinkError, SinkResult};
use crate::sink::LogSink;
use crate::task::{Spawner, ThreadSpawner};
use chrono::{NaiveDateTime, TimeDelta};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Default rotation threshold (10 MiB).
pub const DEFAULT_MAX_FILE_LEN: u64 = 10 * 1024 * 1024;

/// Default number of compressed archives kept.
pub const DEFAULT_MAX_ARCHIVED_FILES: usize = 7;

/// A log file that rotates itself once it grows past a size threshold.
///
/// After every append the file size is checked. When it reaches `max_len`
/// the file is closed, renamed to a timestamped archive next to it and a
/// fresh file is opened at the original path. The archive is then gzipped
/// and old compressed archives are pruned on a background task, so the
/// writer never waits for compression.
///
/// # Crash recovery
///
/// Opening the writer scans for archives that were renamed but never
/// compressed (the process died mid-compression) and compresses them in the
/// background.
///
/// Archive names have second resolution. A rotation that would reuse the
/// name of an existing archive, or one not newer than the previous rotation,
/// takes the next free second instead.
///
/// # Thread Safety
///
/// The writer assumes a single logical writer. Wrap it in an async writer
/// rather than sharing it between threads.
///
/// # Example
///
/// ```no_run
/// use tidelog_sink::{LogSink, RotatingFileWriter};
///
/// let mut writer = RotatingFileWriter::open("logs/app.log", 1024 * 1024, 5).unwrap();
/// writer.write(b"service started\n").unwrap();
/// ```
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    /// `None` only after a rotation failed past the close step.
    file: Option<File>,
    max_len: u64,
    max_files: usize,
    clock: Arc<dyn Clock>,
    spawner: Arc<dyn Spawner>,
    /// Timestamp of the last archive this writer created.
    last_archived: Option<NaiveDateTime>,
}

/// Builder for [`RotatingFileWriter`] with injectable clock and spawner.
#[derive(Debug)]
pub struct RotatingFileWriterBuilder {
    path: PathBuf,
    max_len: u64,
    max_files: usize,
    clock: Arc<dyn Clock>,
    spawner: Arc<dyn Spawner>,
}

impl RotatingFileWriterBuilder {
    /// Sets the size at which the active file rotates.
    #[must_use]
    pub fn max_len(mut self, max_len: u64) -> Self {
        self.max_len = max_len;
        self
    }

    /// Sets how many compressed archives are kept.
    #[must_use]
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Sets the clock used for archive timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the spawner running compression and pruning.
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Opens the active file and starts crash recovery.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Configuration`] if `max_len` is zero, or an error
    /// if the parent directory cannot be created or the file cannot be opened.
    pub fn open(self) -> SinkResult<RotatingFileWriter> {
        if self.max_len == 0 {
            return Err(SinkError::configuration(
                "max file length must be at least 1 byte",
            ));
        }
        let file = open_with_create_dirs(&self.path)?;

        let writer = RotatingFileWriter {
            path: self.path,
            file: Some(file),
            max_len: self.max_len,
            max_files: self.max_files,
            clock: self.clock,
            spawner: self.spawner,
            last_archived: None,
        };
        writer.recover_pending_archives();
        Ok(writer)
    }
}

impl RotatingFileWriter {
    /// Opens or creates a rotating log file at `path`.
    ///
    /// * `max_len` - rotate once the file reaches this many bytes
    /// * `max_files` - compressed archives to keep, older ones are deleted
    ///
    /// # Errors
    ///
    /// Returns an error if `max_len` is zero, the parent directory cannot be
    /// created or the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, max_len: u64, max_files: usize) -> SinkResult<Self> {
        Self::builder(path)
            .max_len(max_len)
            .max_files(max_files)
            .open()
    }

    /// Starts building a writer for `path` using the system clock and
    /// background threads.
    pub fn builder(path: impl AsRef<Path>) -> RotatingFileWriterBuilder {
        RotatingFileWriterBuilder {
            path: path.as_ref().to_path_buf(),
            max_len: DEFAULT_MAX_FILE_LEN,
            max_files: DEFAULT_MAX_ARCHIVED_FILES,
            clock: Arc::new(SystemClock),
            spawner: Arc::new(ThreadSpawner),
        }
    }

    /// Returns the path of the active file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the rotation threshold in bytes.
    #[must_use]
    pub fn max_len(&self) -> u64 {
        self.max_len
    }

    /// Returns how many compressed archives are kept.
    #[must_use]
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Returns the current size of the active file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn size(&self) -> SinkResult<u64> {
        let len = match &self.file {
            Some(file) => file.metadata()?.len(),
            None => fs::metadata(&self.path)?.len(),
        };
        Ok(len)
    }

    fn active_file(&mut self) -> SinkResult<&mut File> {
        if self.file.is_none() {
            debug!(path = %self.path.display(), "reopening log file after failed rotation");
            self.file = Some(open_append(&self.path)?);
        }
        self.file.as_mut().ok_or(SinkError::Closed)
    }

    /// Closes, renames and reopens the active file, then hands the archive
    /// to a background task.
    fn rotate(&mut self) -> SinkResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()
                .map_err(|e| SinkError::rotation(RotationStep::Close, &self.path, e))?;
        }

        let mut stamp = self.clock.now();
        if let Some(last) = self.last_archived.filter(|last| stamp <= *last) {
            stamp = last.checked_add_signed(TimeDelta::seconds(1)).unwrap_or(last);
        }
        let (archive, stamp) = archive::unused_archive_path(&self.path, stamp);
        fs::rename(&self.path, &archive)
            .map_err(|e| SinkError::rotation(RotationStep::Rename, &self.path, e))?;

        let file = open_append(&self.path)
            .map_err(|e| SinkError::rotation(RotationStep::Reopen, &self.path, e))?;
        self.file = Some(file);
        self.last_archived = Some(stamp);

        debug!(
            path = %self.path.display(),
            archive = %archive.display(),
            "rotated log file"
        );

        let path = self.path.clone();
        let max_files = self.max_files;
        self.spawner.spawn(
            "compress",
            Box::new(move || compress_then_prune(&archive, &path, max_files)),
        );
        Ok(())
    }

    fn recover_pending_archives(&self) {
        let pending = match archive::uncompressed_archives(&self.path) {
            Ok(pending) => pending,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to scan for uncompressed archives");
                return;
            }
        };

        for archive in pending {
            info!(archive = %archive.display(), "compressing archive left by an earlier run");
            self.spawner.spawn(
                "recover",
                Box::new(move || {
                    if let Err(e) = archive::compress_archive(&archive) {
                        error!(error = %e, "archive recovery failed");
                    }
                }),
            );
        }
    }
}

impl LogSink for RotatingFileWriter {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        let file = self.active_file()?;
        file.write_all(data)?;

        let size = file.metadata()?.len();
        if size >= self.max_len {
            self.rotate()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> SinkResult<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Background half of a rotation. Failures go to the diagnostic channel;
/// the write that triggered the rotation has already succeeded.
fn compress_then_prune(archive: &Path, path: &Path, max_files: usize) {
    match archive::compress_archive(archive) {
        Ok(gz) => {
            debug!(archive = %gz.display(), "compressed archive");
            match archive::prune_archives(path, max_files) {
                Ok(removed) if !removed.is_empty() => {
                    debug!(path = %path.display(), removed = removed.len(), "pruned old archives");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "archive pruning failed"),
            }
        }
        Err(e) => error!(error = %e, "archive compression failed"),
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn open_with_create_dirs(path: &Path) -> SinkResult<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SinkError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(open_append(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{compressed_archives, compressed_path, uncompressed_archives};
    use crate::clock::FakeClock;
    use crate::task::InlineSpawner;
    use chrono::{NaiveDate, NaiveDateTime};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::time::Duration;
    use tempfile::tempdir;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn writer(path: &Path, max_len: u64, max_files: usize, clock: &FakeClock) -> RotatingFileWriter {
        RotatingFileWriter::builder(path)
            .max_len(max_len)
            .max_files(max_files)
            .clock(Arc::new(clock.clone()))
            .spawner(Arc::new(InlineSpawner))
            .open()
            .unwrap()
    }

    fn gunzip(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("app.log");

        let writer = RotatingFileWriter::open(&path, 1024, 3).unwrap();
        assert!(path.exists());
        assert_eq!(writer.size().unwrap(), 0);
        assert_eq!(writer.path(), path);
        assert_eq!(writer.max_len(), 1024);
        assert_eq!(writer.max_files(), 3);
    }

    #[test]
    fn zero_max_len_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let result = RotatingFileWriter::open(&path, 0, 3);
        assert!(matches!(result, Err(SinkError::Configuration { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn file_appends_to_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"earlier\n").unwrap();

        let clock = FakeClock::new(start());
        let mut w = writer(&path, 1024, 3, &clock);
        w.write(b"later\n").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"earlier\nlater\n");
        assert_eq!(w.size().unwrap(), 14);
    }

    #[test]
    fn below_threshold_does_not_rotate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 10, 3, &clock);

        assert_eq!(w.write(b"123456789").unwrap(), 9);
        assert_eq!(w.size().unwrap(), 9);
        assert!(compressed_archives(&path).unwrap().is_empty());
    }

    #[test]
    fn reaching_threshold_rotates_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 10, 3, &clock);

        w.write(b"12345").unwrap();
        w.write(b"67890").unwrap();

        assert_eq!(w.size().unwrap(), 0);
        let archives = compressed_archives(&path).unwrap();
        assert_eq!(
            archives,
            vec![dir.path().join("app-2024-03-05-140000.log.gz")]
        );
        assert_eq!(gunzip(&archives[0]), "1234567890");
        assert!(uncompressed_archives(&path).unwrap().is_empty());

        w.write(b"next").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"next");
        assert_eq!(compressed_archives(&path).unwrap().len(), 1);
    }

    #[test]
    fn oversized_single_write_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 4, 3, &clock);

        assert_eq!(w.write(b"far more than four bytes").unwrap(), 24);
        assert_eq!(w.size().unwrap(), 0);
        assert_eq!(compressed_archives(&path).unwrap().len(), 1);
    }

    #[test]
    fn retention_keeps_most_recent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 8, 2, &clock);

        for i in 0..5 {
            w.write(format!("record-{i}").as_bytes()).unwrap();
            clock.advance(Duration::from_secs(1));
        }

        let names: Vec<_> = compressed_archives(&path)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["app-2024-03-05-140003.log.gz", "app-2024-03-05-140004.log.gz"]
        );
        assert_eq!(gunzip(&dir.path().join(&names[1])), "record-4");
    }

    #[test]
    fn startup_compresses_leftover_archives() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let leftover = dir.path().join("app-2024-03-01-000000.log");
        fs::write(&leftover, b"from a crashed run").unwrap();
        fs::write(compressed_path(&leftover), b"partial").unwrap();
        let unrelated = dir.path().join("app-server.log");
        fs::write(&unrelated, b"not ours").unwrap();

        let clock = FakeClock::new(start());
        let _w = writer(&path, 1024, 3, &clock);

        assert!(!leftover.exists());
        assert_eq!(gunzip(&compressed_path(&leftover)), "from a crashed run");
        assert!(unrelated.exists());
    }

    #[test]
    fn burst_within_one_second_keeps_every_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 4, 2, &clock);

        for record in [b"aaaa", b"bbbb", b"cccc"] {
            w.write(record).unwrap();
        }

        let archives = compressed_archives(&path).unwrap();
        assert_eq!(
            archives,
            vec![
                dir.path().join("app-2024-03-05-140001.log.gz"),
                dir.path().join("app-2024-03-05-140002.log.gz"),
            ]
        );
        assert_eq!(gunzip(&archives[0]), "bbbb");
        assert_eq!(gunzip(&archives[1]), "cccc");
    }

    #[test]
    fn archive_names_stay_ordered_after_burst() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 4, 10, &clock);

        for _ in 0..3 {
            w.write(b"xxxx").unwrap();
        }
        // The clock is now behind the last archive name.
        clock.advance(Duration::from_secs(1));
        w.write(b"late").unwrap();

        let names: Vec<_> = compressed_archives(&path)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "app-2024-03-05-140000.log.gz",
                "app-2024-03-05-140001.log.gz",
                "app-2024-03-05-140002.log.gz",
                "app-2024-03-05-140003.log.gz",
            ]
        );
        assert_eq!(gunzip(&dir.path().join(&names[3])), "late");
    }

    #[test]
    fn startup_retries_failed_compression() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let archive = archive::archive_path(&path, start());
        fs::write(&archive, b"retry me").unwrap();

        fs::create_dir(compressed_path(&archive)).unwrap();
        assert!(archive::compress_archive(&archive).is_err());
        assert!(archive.exists());
        fs::remove_dir(compressed_path(&archive)).unwrap();

        let clock = FakeClock::new(start());
        let _w = writer(&path, 1024, 3, &clock);

        assert!(!archive.exists());
        assert_eq!(gunzip(&compressed_path(&archive)), "retry me");
    }

    #[test]
    fn failed_rename_is_returned_and_next_write_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let clock = FakeClock::new(start());
        let mut w = writer(&path, 4, 3, &clock);

        // With the active file unlinked there is nothing to rename.
        fs::remove_file(&path).unwrap();

        let result = w.write(b"12345");
        assert!(matches!(
            result,
            Err(SinkError::Rotation {
                step: RotationStep::Rename,
                ..
            })
        ));

        w.write(b"6").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"6");

        w.write(b"789").unwrap();
        assert_eq!(w.size().unwrap(), 0);
        assert_eq!(compressed_archives(&path).unwrap().len(), 1);
    }
}
