//! Prune command implementation.

use std::path::Path;
use tidelog_sink::archive;

/// Runs the prune command.
pub fn run(path: &Path, max_files: usize) -> Result<(), Box<dyn std::error::Error>> {
    let removed = archive::prune_archives(path, max_files)?;

    println!("Kept at most {} compressed archives", max_files);
    for file in &removed {
        println!("  removed {}", file.display());
    }
    println!("{} archive(s) removed", removed.len());
    Ok(())
}
