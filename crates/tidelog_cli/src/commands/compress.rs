//! Compress command implementation.

use std::path::{Path, PathBuf};
use tidelog_sink::{archive, SinkResult};

/// Runs the compress command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let compressed = compress_pending(path)?;
    if compressed.is_empty() {
        println!("No pending archives");
    }
    for gz in &compressed {
        println!("✓ {}", gz.display());
    }
    Ok(())
}

/// Compresses every uncompressed archive of `path`, oldest first.
///
/// Stops at the first archive that cannot be compressed.
pub fn compress_pending(path: &Path) -> SinkResult<Vec<PathBuf>> {
    archive::uncompressed_archives(path)?
        .iter()
        .map(|pending| archive::compress_archive(pending))
        .collect()
}
