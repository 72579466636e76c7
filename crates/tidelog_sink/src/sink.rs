//! Sink trait definition.

use crate::error::SinkResult;
use std::io::Write;

/// A byte sink that log records are written to.
///
/// Sinks are **opaque byte consumers**. They never parse, frame or reorder
/// what they receive; a record is whatever byte slice the caller hands over.
///
/// # Invariants
///
/// - `write` either accepts all of `data` and returns its length, or fails
/// - an error from `write` is fatal for that call only; the sink decides
///   whether later writes can succeed
/// - sinks must be `Send` so a background drain thread can own them
///
/// # Implementors
///
/// - [`super::MemorySink`] - For testing
/// - [`super::IoSink`] - Any `std::io::Write` (stderr, a buffer)
/// - [`super::RotatingFileWriter`] - Size-bounded rotating log files
pub trait LogSink: Send {
    /// Writes one record.
    ///
    /// Returns the number of bytes accepted, which is `data.len()` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device rejects the write.
    fn write(&mut self, data: &[u8]) -> SinkResult<usize>;

    /// Flushes buffered bytes to the underlying device.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> SinkResult<()> {
        (**self).flush()
    }
}

/// Adapts any [`std::io::Write`] into a [`LogSink`].
///
/// ```rust
/// use tidelog_sink::{IoSink, LogSink};
///
/// let mut sink = IoSink::new(Vec::new());
/// sink.write(b"hello").unwrap();
/// assert_eq!(sink.into_inner(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write + Send> IoSink<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> LogSink for IoSink<W> {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        self.inner.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}
