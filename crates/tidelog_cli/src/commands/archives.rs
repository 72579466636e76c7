//! Archives command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use tidelog_sink::archive;

/// Runs the archives command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let compressed = archive::compressed_archives(path)?;
    let pending = archive::uncompressed_archives(path)?;

    println!("Archives of {:?}", path);
    println!();
    print_group("Compressed", &compressed);
    println!();
    print_group("Pending compression", &pending);
    Ok(())
}

fn print_group(title: &str, files: &[PathBuf]) {
    println!("{} ({}):", title, files.len());
    for file in files {
        let size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {:<40} {:>12} bytes", name, size);
    }
}
