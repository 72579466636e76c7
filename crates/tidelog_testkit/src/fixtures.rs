//! Log directory fixtures.

use chrono::{NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tidelog_sink::archive;

/// Builds a timestamp on a fixed day, for archive names and fake clocks.
///
/// # Panics
///
/// Panics if the time of day is out of range.
pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .and_then(|day| day.and_hms_opt(hour, minute, second))
        .expect("valid time of day")
}

/// A temporary log directory with automatic cleanup.
#[derive(Debug)]
pub struct LogDir {
    dir: TempDir,
}

impl LogDir {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// The directory itself.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the active log file, `app.log`.
    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("app.log")
    }

    /// Writes an uncompressed archive of `app.log` rotated at `time`.
    pub fn place_archive(&self, time: NaiveDateTime, content: &[u8]) -> PathBuf {
        let path = archive::archive_path(&self.log_path(), time);
        fs::write(&path, content).expect("Failed to write archive");
        path
    }

    /// Writes a compressed archive of `app.log` rotated at `time`.
    pub fn place_compressed(&self, time: NaiveDateTime, content: &[u8]) -> PathBuf {
        let path = self.place_archive(time, content);
        archive::compress_archive(&path).expect("Failed to compress archive")
    }

    /// Compressed archives of `app.log`, oldest first.
    pub fn compressed(&self) -> Vec<PathBuf> {
        archive::compressed_archives(&self.log_path()).expect("Failed to list archives")
    }

    /// Archives of `app.log` still waiting for compression, oldest first.
    pub fn uncompressed(&self) -> Vec<PathBuf> {
        archive::uncompressed_archives(&self.log_path()).expect("Failed to list archives")
    }

    /// Every file name in the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("Failed to read directory")
            .map(|entry| {
                entry
                    .expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Contents of the active log file.
    pub fn read_log(&self) -> Vec<u8> {
        fs::read(self.log_path()).expect("Failed to read log file")
    }
}

impl Default for LogDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompresses a gzip file.
pub fn read_gz(path: &Path) -> Vec<u8> {
    let file = File::open(path).expect("Failed to open gzip file");
    let mut data = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut data)
        .expect("Failed to decompress");
    data
}
