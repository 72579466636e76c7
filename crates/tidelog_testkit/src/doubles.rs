//! Sink test doubles.
//!
//! [`GatedSink`] stalls the consumer of a queue at a known point so a test
//! can fill the queue behind it. [`FailingSink`] starts failing after a set
//! number of writes.

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tidelog_sink::{LogSink, MemorySink, SinkError, SinkResult};

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    entered: usize,
}

#[derive(Debug, Default)]
struct GateInner {
    state: Mutex<GateState>,
    changed: Condvar,
}

/// A barrier that writers wait on until a test opens it.
///
/// Clones share the same gate.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<GateInner>,
}

impl Gate {
    /// Creates a gate that blocks every writer.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Lets all waiting and future writers through.
    pub fn open(&self) {
        self.inner.state.lock().open = true;
        self.inner.changed.notify_all();
    }

    /// Number of writers that reached the gate so far.
    pub fn entered(&self) -> usize {
        self.inner.state.lock().entered
    }

    /// Waits until at least `count` writers reached the gate.
    ///
    /// Returns false if `timeout` elapsed first.
    pub fn wait_entered(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while state.entered < count {
            if self
                .inner
                .changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.entered >= count;
            }
        }
        true
    }

    fn pass(&self) {
        let mut state = self.inner.state.lock();
        state.entered += 1;
        self.inner.changed.notify_all();
        while !state.open {
            self.inner.changed.wait(&mut state);
        }
    }
}

/// Wraps a sink so every write first waits at a [`Gate`].
#[derive(Debug)]
pub struct GatedSink<S> {
    inner: S,
    gate: Gate,
}

impl<S: LogSink> GatedSink<S> {
    /// Wraps `inner` behind `gate`.
    pub fn new(inner: S, gate: Gate) -> Self {
        Self { inner, gate }
    }
}

impl<S: LogSink> LogSink for GatedSink<S> {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        self.gate.pass();
        self.inner.write(data)
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.inner.flush()
    }
}

/// A sink that accepts `n` writes and fails every write after that.
///
/// Accepted records land in [`probe`](Self::probe). Clones share the probe
/// and the attempt count.
#[derive(Debug, Clone)]
pub struct FailingSink {
    probe: MemorySink,
    succeed: usize,
    attempts: Arc<AtomicUsize>,
}

impl FailingSink {
    /// Creates a sink whose first `n` writes succeed.
    pub fn after(n: usize) -> Self {
        Self {
            probe: MemorySink::new(),
            succeed: n,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Records that were accepted.
    pub fn probe(&self) -> MemorySink {
        self.probe.clone()
    }

    /// Writes attempted so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl LogSink for FailingSink {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.succeed {
            self.probe.write(data)
        } else {
            Err(SinkError::Io(io::Error::other("injected sink failure")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn gate_holds_writer_until_opened() {
        let gate = Gate::closed();
        let probe = MemorySink::new();
        let mut sink = GatedSink::new(probe.clone(), gate.clone());

        let handle = thread::spawn(move || sink.write(b"held").unwrap());
        assert!(gate.wait_entered(1, Duration::from_secs(5)));
        assert!(probe.is_empty());

        gate.open();
        assert_eq!(handle.join().unwrap(), 4);
        assert_eq!(probe.records(), vec![b"held".to_vec()]);
    }

    #[test]
    fn wait_entered_times_out() {
        let gate = Gate::closed();
        assert!(!gate.wait_entered(1, Duration::from_millis(20)));
        assert_eq!(gate.entered(), 0);
    }

    #[test]
    fn open_gate_passes_through() {
        let gate = Gate::closed();
        gate.open();
        let probe = MemorySink::new();
        let mut sink = GatedSink::new(probe.clone(), gate.clone());

        sink.write(b"a").unwrap();
        sink.write(b"b").unwrap();
        assert_eq!(gate.entered(), 2);
        assert_eq!(probe.len(), 2);
    }

    #[test]
    fn failing_sink_fails_after_n() {
        let mut sink = FailingSink::after(2);
        assert!(sink.write(b"one").is_ok());
        assert!(sink.write(b"two").is_ok());
        assert!(matches!(sink.write(b"three"), Err(SinkError::Io(_))));

        assert_eq!(sink.attempts(), 3);
        assert_eq!(sink.probe().records(), vec![b"one".to_vec(), b"two".to_vec()]);
    }
}
