//! Archive naming, compression and retention.
//!
//! A log file `<dir>/<stem><ext>` rotates into archives that live next to it:
//!
//! ```text
//! <dir>/
//! ├─ app.log                          # active file
//! ├─ app-2024-03-05-140102.log        # archive, compression pending
//! └─ app-2024-03-05-120000.log.gz     # compressed archive
//! ```
//!
//! The timestamp layout is fixed width and most-significant first, so sorting
//! archive names as strings sorts them oldest to newest.

use crate::error::{SinkError, SinkResult};
use chrono::{NaiveDateTime, TimeDelta};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `strftime` layout of the archive timestamp, second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Suffix appended to an archive once compressed.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// A log path split into the parts archive names are built from.
struct LogName {
    dir: PathBuf,
    stem: String,
    ext: String,
}

impl LogName {
    fn new(path: &Path) -> Self {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self { dir, stem, ext }
    }

    /// Parses `name` as an archive of this log, returning its timestamp.
    fn parse(&self, name: &str, compressed: bool) -> Option<NaiveDateTime> {
        let rest = name.strip_prefix(self.stem.as_str())?.strip_prefix('-')?;
        let rest = if compressed {
            rest.strip_suffix(COMPRESSED_SUFFIX)?
        } else {
            rest
        };
        let stamp = rest.strip_suffix(self.ext.as_str())?;
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }
}

/// Returns the archive name for `path` rotated at `time`.
///
/// `logs/app.log` at 2024-03-05 14:01:02 becomes
/// `logs/app-2024-03-05-140102.log`.
#[must_use]
pub fn archive_path(path: &Path, time: NaiveDateTime) -> PathBuf {
    let name = LogName::new(path);
    name.dir.join(format!(
        "{}-{}{}",
        name.stem,
        time.format(TIMESTAMP_FORMAT),
        name.ext
    ))
}

/// Returns the first archive name for `path` at or after `time` that is not
/// in use, together with the timestamp it carries.
///
/// A name is in use while either the archive or its compressed form exists.
/// Taken names are skipped one second at a time, so a burst of rotations
/// within one second gets consecutive timestamps.
#[must_use]
pub fn unused_archive_path(path: &Path, time: NaiveDateTime) -> (PathBuf, NaiveDateTime) {
    let mut time = time;
    loop {
        let candidate = archive_path(path, time);
        if !exists(&candidate) && !exists(&compressed_path(&candidate)) {
            return (candidate, time);
        }
        match time.checked_add_signed(TimeDelta::seconds(1)) {
            Some(next) => time = next,
            None => return (candidate, time),
        }
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Returns the compressed name of an archive (`.gz` appended).
#[must_use]
pub fn compressed_path(archive: &Path) -> PathBuf {
    let mut name = OsString::from(archive.as_os_str());
    name.push(COMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// Lists the compressed archives of `path`, oldest first.
///
/// # Errors
///
/// Returns an error if the log directory cannot be read.
pub fn compressed_archives(path: &Path) -> SinkResult<Vec<PathBuf>> {
    Ok(list_archives(path, true)?)
}

/// Lists the archives of `path` still waiting for compression, oldest first.
///
/// # Errors
///
/// Returns an error if the log directory cannot be read.
pub fn uncompressed_archives(path: &Path) -> SinkResult<Vec<PathBuf>> {
    Ok(list_archives(path, false)?)
}

fn list_archives(path: &Path, compressed: bool) -> io::Result<Vec<PathBuf>> {
    let name = LogName::new(path);
    let mut found = Vec::new();

    for entry in fs::read_dir(&name.dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if name.parse(file_name, compressed).is_some() && entry.file_type()?.is_file() {
            found.push((file_name.to_string(), entry.path()));
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Compresses `archive` into `<archive>.gz` and removes the source.
///
/// The source is removed only after the encoder has been finalized. On any
/// failure both the source and a possibly partial `.gz` are left in place;
/// the next startup scan compresses the source again.
///
/// # Errors
///
/// Returns [`SinkError::Compression`] if any step fails.
pub fn compress_archive(archive: &Path) -> SinkResult<PathBuf> {
    let fail = |e: io::Error| SinkError::compression(archive, e);
    let gz_path = compressed_path(archive);

    let mut source = File::open(archive).map_err(fail)?;
    let dest = File::create(&gz_path).map_err(fail)?;

    let mut encoder = GzEncoder::new(BufWriter::new(dest), Compression::default());
    io::copy(&mut source, &mut encoder).map_err(fail)?;
    let mut dest = encoder.finish().map_err(fail)?;
    dest.flush().map_err(fail)?;
    drop(dest);
    drop(source);

    fs::remove_file(archive).map_err(fail)?;
    Ok(gz_path)
}

/// Deletes the oldest compressed archives of `path` until at most
/// `max_files` remain. Returns the removed files.
///
/// Archives that vanished between listing and removal (a concurrent pruning
/// pass got there first) are skipped.
///
/// # Errors
///
/// Returns [`SinkError::Prune`] if the directory cannot be listed or an
/// archive cannot be removed. Removal stops at the first failure.
pub fn prune_archives(path: &Path, max_files: usize) -> SinkResult<Vec<PathBuf>> {
    let files = list_archives(path, true).map_err(|e| SinkError::prune(path, e))?;
    let excess = files.len().saturating_sub(max_files);

    let mut removed = Vec::with_capacity(excess);
    for file in files.into_iter().take(excess) {
        match fs::remove_file(&file) {
            Ok(()) => removed.push(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SinkError::prune(file, e)),
        }
    }
    Ok(removed)
}
