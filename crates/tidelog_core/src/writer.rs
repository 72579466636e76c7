//! Non-blocking async writer.

use crate::error::{CoreError, CoreResult};
use crate::loss::{LossCounter, LossState};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tidelog_sink::{LogSink, SinkResult};
use tracing::{debug, error, warn};

/// Records queued by default before writes start being dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Decouples log producers from a slow sink.
///
/// `write` copies the record into a bounded queue and returns at once. A
/// single drain thread empties the queue into the sink in FIFO order.
///
/// # Overload
///
/// When the queue is full the record is dropped and counted; the producer
/// is not told. The next record that does get queued is followed by a
/// `Too many logs, N logs lost` notice and the count starts again from zero.
/// A count left pending when writes stop is never reported.
///
/// # Sink failure
///
/// The first error the drain thread sees disables the writer for good:
/// records still queued are discarded unwritten and every later async write
/// is accepted and thrown away. Logging never fails the caller.
///
/// # Close
///
/// [`close`](Self::close) waits for the drain thread to write out what is
/// queued. From then on `write` goes straight to the sink on the caller's
/// thread and returns the sink's own result.
///
/// # Example
///
/// ```rust
/// use tidelog_core::AsyncWriter;
/// use tidelog_sink::MemorySink;
///
/// let probe = MemorySink::new();
/// let writer = AsyncWriter::new(probe.clone()).unwrap();
/// writer.write(b"hello").unwrap();
/// writer.close().unwrap();
/// assert_eq!(probe.data(), b"hello");
/// ```
pub struct AsyncWriter<S: LogSink + 'static> {
    sink: Arc<Mutex<S>>,
    /// `None` once `close` has shut the queue.
    queue: RwLock<Option<Sender<Vec<u8>>>>,
    loss: Arc<LossCounter>,
    /// Guards the close sequence so it runs once.
    closing: AtomicBool,
    /// Set after the drain thread has exited; writes bypass the queue.
    closed: AtomicBool,
    drain: Mutex<Option<JoinHandle<()>>>,
    capacity: usize,
}

impl<S: LogSink + 'static> AsyncWriter<S> {
    /// Wraps `sink` with the default queue capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the drain thread cannot be started.
    pub fn new(sink: S) -> CoreResult<Self> {
        Self::with_capacity(sink, DEFAULT_QUEUE_CAPACITY)
    }

    /// Wraps `sink` with a queue holding at most `capacity` records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if `capacity` is zero, or an I/O
    /// error if the drain thread cannot be started.
    pub fn with_capacity(sink: S, capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(CoreError::configuration("queue capacity must be at least 1"));
        }

        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let sink = Arc::new(Mutex::new(sink));
        let loss = Arc::new(LossCounter::new());

        let handle = {
            let sink = Arc::clone(&sink);
            let loss = Arc::clone(&loss);
            thread::Builder::new()
                .name("tidelog-drain".to_string())
                .spawn(move || drain_loop(receiver, sink, loss))?
        };

        Ok(Self {
            sink,
            queue: RwLock::new(Some(sender)),
            loss,
            closing: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            drain: Mutex::new(Some(handle)),
            capacity,
        })
    }

    /// Writes one record.
    ///
    /// Before [`close`](Self::close) this never blocks on the sink and
    /// always reports `data.len()` bytes accepted, whether the record was
    /// queued, dropped for lack of room, or discarded because the sink has
    /// failed. After close the record is written synchronously.
    ///
    /// # Errors
    ///
    /// Only after close: returns the sink's error.
    pub fn write(&self, data: &[u8]) -> SinkResult<usize> {
        if self.closed.load(Ordering::Acquire) {
            return self.write_through(data);
        }

        let observed = self.loss.state();
        if observed == LossState::Disabled {
            return Ok(data.len());
        }

        let queue = self.queue.read();
        let Some(sender) = queue.as_ref() else {
            // Close is in progress; the queue no longer takes records.
            drop(queue);
            return self.write_through(data);
        };

        match sender.try_send(data.to_vec()) {
            Ok(()) => {
                drop(queue);
                if let LossState::Lossy(seen) = observed {
                    self.report_loss(seen);
                }
            }
            Err(TrySendError::Full(_)) => self.loss.record_drop(),
            // The drain thread exited after a sink failure.
            Err(TrySendError::Disconnected(_)) => {}
        }
        Ok(data.len())
    }

    fn report_loss(&self, seen: u64) {
        let Some(lost) = self.loss.take(seen) else {
            return;
        };
        let notice = format!("Too many logs, {lost} logs lost");
        if let Err(e) = self.write(notice.as_bytes()) {
            warn!(lost, error = %e, "failed to write lost-logs notice");
        }
    }

    fn write_through(&self, data: &[u8]) -> SinkResult<usize> {
        self.sink.lock().write(data)
    }

    /// Shuts the queue, waits for the drain thread to write out what is
    /// queued, then switches to synchronous writes.
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DrainPanicked`] if the drain thread panicked, or
    /// the sink's error if the final flush fails.
    pub fn close(&self) -> CoreResult<()> {
        if self
            .closing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        // Dropping the only sender lets the drain loop end once it is empty.
        drop(self.queue.write().take());

        let handle = self.drain.lock().take();
        let joined = match handle {
            Some(handle) => handle.join().map_err(|_| CoreError::DrainPanicked),
            None => Ok(()),
        };
        self.closed.store(true, Ordering::Release);
        debug!(state = ?self.loss.state(), "async writer closed");

        joined?;
        self.sink.lock().flush()?;
        Ok(())
    }

    /// Returns true once [`close`](Self::close) has completed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the current loss counter state.
    #[must_use]
    pub fn loss_state(&self) -> LossState {
        self.loss.state()
    }

    /// Returns the queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn drain_loop<S: LogSink>(queue: Receiver<Vec<u8>>, sink: Arc<Mutex<S>>, loss: Arc<LossCounter>) {
    for record in queue.iter() {
        let result = sink.lock().write(&record);
        if let Err(e) = result {
            loss.disable();
            let discarded = queue.try_iter().count();
            error!(error = %e, discarded, "log sink failed, async writer disabled");
            return;
        }
    }
    debug!("drain thread finished");
}

impl<S: LogSink + 'static> Drop for AsyncWriter<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close async writer on drop");
        }
    }
}

impl<S: LogSink + 'static> std::fmt::Debug for AsyncWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncWriter")
            .field("capacity", &self.capacity)
            .field("loss", &self.loss.state())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<S: LogSink + 'static> LogSink for AsyncWriter<S> {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        AsyncWriter::write(self, data)
    }
}

impl<S: LogSink + 'static> io::Write for &AsyncWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        AsyncWriter::write(self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: LogSink + 'static> io::Write for AsyncWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
