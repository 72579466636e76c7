//! Tidelog CLI
//!
//! Pipes standard input into a rotating, compressed log file and maintains
//! the archives of an existing log.
//!
//! # Commands
//!
//! - `pipe` - Write stdin to a rotating log file without blocking the producer
//! - `archives` - List the archives of a log file
//! - `compress` - Compress archives left uncompressed
//! - `prune` - Delete the oldest compressed archives

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tidelog_core::{Config, DEFAULT_QUEUE_CAPACITY};
use tidelog_sink::{DEFAULT_MAX_ARCHIVED_FILES, DEFAULT_MAX_FILE_LEN};
use tracing_subscriber::EnvFilter;

/// Tidelog log file tools.
#[derive(Parser)]
#[command(name = "tidelog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the active log file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write stdin to a rotating log file
    Pipe {
        /// Rotate once the file reaches this many bytes
        #[arg(long, default_value_t = DEFAULT_MAX_FILE_LEN)]
        max_len: u64,

        /// Compressed archives to keep
        #[arg(long, default_value_t = DEFAULT_MAX_ARCHIVED_FILES)]
        max_files: usize,

        /// Records buffered before input starts being dropped
        #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
        queue: usize,

        /// Write one record per input line instead of raw chunks
        #[arg(short, long)]
        line_buffered: bool,
    },

    /// List compressed and pending archives
    Archives,

    /// Compress archives left uncompressed
    Compress,

    /// Delete the oldest compressed archives
    Prune {
        /// Compressed archives to keep
        #[arg(long)]
        max_files: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout is left to the commands.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Pipe {
            max_len,
            max_files,
            queue,
            line_buffered,
        } => {
            let path = cli.path.ok_or("Log path required for pipe")?;
            let config = Config::new()
                .max_file_len(max_len)
                .max_archived_files(max_files)
                .queue_capacity(queue);
            commands::pipe::run(&path, &config, line_buffered)?;
        }
        Commands::Archives => {
            let path = cli.path.ok_or("Log path required for archives")?;
            commands::archives::run(&path)?;
        }
        Commands::Compress => {
            let path = cli.path.ok_or("Log path required for compress")?;
            commands::compress::run(&path)?;
        }
        Commands::Prune { max_files } => {
            let path = cli.path.ok_or("Log path required for prune")?;
            commands::prune::run(&path, max_files)?;
        }
    }

    Ok(())
}
