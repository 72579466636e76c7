//! Pipe command implementation.

use std::io::{self, BufRead};
use std::path::Path;
use tidelog_core::{open_file_log, AsyncWriter, Config, LossState};
use tidelog_sink::LogSink;
use tracing::{info, warn};

const CHUNK_SIZE: usize = 8 * 1024;

/// Runs the pipe command.
pub fn run(
    path: &Path,
    config: &Config,
    line_buffered: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = open_file_log(path, config)?;

    let stdin = io::stdin();
    let records = copy_records(stdin.lock(), &log, line_buffered)?;
    log.close()?;

    match log.loss_state() {
        LossState::Healthy => info!(records, "input finished"),
        LossState::Lossy(lost) => {
            warn!(records, lost, "input finished, last records were dropped");
        }
        LossState::Disabled => {
            warn!(records, "input finished, log file failed and writing stopped");
        }
    }
    Ok(())
}

/// Copies `input` into `log` one record at a time until EOF.
///
/// A record is a line (newline kept) or, unbuffered, whatever one read
/// returned. Returns the number of records handed to the writer.
pub fn copy_records<R, S>(
    mut input: R,
    log: &AsyncWriter<S>,
    line_buffered: bool,
) -> io::Result<u64>
where
    R: BufRead,
    S: LogSink + 'static,
{
    let mut records = 0;
    if line_buffered {
        let mut line = Vec::new();
        while input.read_until(b'\n', &mut line)? > 0 {
            log.write(&line).map_err(io::Error::other)?;
            line.clear();
            records += 1;
        }
    } else {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match input.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            log.write(&chunk[..n]).map_err(io::Error::other)?;
            records += 1;
        }
    }
    Ok(records)
}
